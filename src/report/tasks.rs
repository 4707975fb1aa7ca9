//! The seven analyses of the report. Each one turns the filtered flats into a
//! text description and a chart.

use anyhow::{Result, bail};
use std::collections::{BTreeMap, HashSet};

use super::chart::{Bar, Chart, Panel};
use super::format::{compact_millions, format_price, millions, round_to_ten_thousand, thousands};
use super::types::Flat;
use super::utility::{bottom_n, group_mean, group_values, mean, quantile, top_n};

#[derive(Debug, Clone, PartialEq)]
pub struct TaskReport {
    pub number: u32,
    pub description: String,
    pub chart: Chart,
}

pub type TaskFn = fn(&[Flat]) -> Result<TaskReport>;

/// All tasks in report order.
pub const TASKS: [TaskFn; 7] = [
    expensive_districts,
    price_per_m2_by_type,
    streets,
    floors,
    districts_by_type,
    districts_vs_city,
    rooms,
];

const ROOM_LABELS: [&str; 5] = ["Studio", "1-room", "2-room", "3-room", "4+ rooms"];

fn numbered(pairs: &[(String, f64)], unit: impl Fn(&str) -> String) -> String {
    pairs
        .iter()
        .enumerate()
        .map(|(i, (name, price))| format!("{}. {}: {} mln RUB", i + 1, unit(name), millions(*price)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn bars(pairs: &[(String, f64)]) -> Vec<Bar> {
    pairs.iter().map(|(label, value)| Bar::new(label.clone(), *value)).collect()
}

/// Task 1: the five districts with the most expensive flats, and for each up
/// to two of its priciest flats near different metro stations.
pub fn expensive_districts(flats: &[Flat]) -> Result<TaskReport> {
    let max_by_district: Vec<(String, f64)> = group_values(flats, |f| f.district.clone(), |f| f.price)
        .into_iter()
        .map(|(district, prices)| (district, prices.into_iter().fold(f64::MIN, f64::max)))
        .collect();
    let top = top_n(max_by_district, 5);
    if top.is_empty() {
        bail!("no flats with a district");
    }

    let mut chart_bars = Vec::new();
    let mut lines = Vec::new();

    for (district, max_price) in &top {
        let mut in_district: Vec<&Flat> = flats
            .iter()
            .filter(|f| f.district.as_ref() == Some(district))
            .collect();
        in_district.sort_by(|a, b| b.price.total_cmp(&a.price));

        let mut stations = HashSet::new();
        let picked: Vec<&Flat> = in_district
            .into_iter()
            .filter(|f| stations.insert(f.underground.clone()))
            .take(2)
            .collect();

        let metro_prices: Vec<String> = picked
            .iter()
            .map(|f| {
                let metro = f.underground.as_deref().unwrap_or("no metro");
                chart_bars.push(Bar::new(format!("{district}: {metro}"), f.price));
                format!("{metro}: {} mln", millions(f.price))
            })
            .collect();

        lines.push(format!(
            "- {district}: max price {} mln RUB (metro: {})",
            millions(*max_price),
            metro_prices.join(", ")
        ));
    }

    Ok(TaskReport {
        number: 1,
        description: format!(
            "Top 5 districts by maximum flat price.\n\nDistricts:\n{}",
            lines.join("\n")
        ),
        chart: Chart::single(Panel::prices(
            "Top 5 most expensive flats by district and metro",
            "Metro",
            chart_bars,
        )),
    })
}

/// Task 2: mean price per m² by property type with the 5% tails of each type
/// trimmed, plus the gap between the last two types.
pub fn price_per_m2_by_type(flats: &[Flat]) -> Result<TaskReport> {
    let groups = group_values(flats, |f| f.type_property.clone(), |f| f.price_per_m2);
    if groups.len() < 2 {
        bail!("need at least two property types, found {}", groups.len());
    }

    let means: Vec<(String, f64)> = groups
        .into_iter()
        .map(|(kind, values)| (kind, trimmed_mean(&values)))
        .collect();

    let last = means.len() - 1;
    let diff = (means[last].1 - means[last - 1].1).abs();

    let lines: Vec<String> = means
        .iter()
        .map(|(kind, value)| {
            format!("- {kind}: {} thousand RUB/m²", thousands(round_to_ten_thousand(*value)))
        })
        .collect();

    let mut chart_bars = bars(&means);
    chart_bars.push(Bar::new("Difference", diff));

    Ok(TaskReport {
        number: 2,
        description: format!(
            "Price per m² by property type with 5% outliers removed.\n\
             Prices rounded to 10 thousand:\n{}\nDifference: {} thousand RUB/m²",
            lines.join("\n"),
            thousands(round_to_ten_thousand(diff))
        ),
        chart: Chart::single(
            Panel::prices(
                "Price per m² by property type (5% outliers removed)",
                "Property type",
                chart_bars,
            )
            .with_y_desc("Price per m²"),
        ),
    })
}

/// Mean of the values inside the 5th to 95th percentile. Falls back to the
/// plain mean when the band holds no values.
fn trimmed_mean(values: &[f64]) -> f64 {
    let (Some(lo), Some(hi)) = (quantile(values, 0.05), quantile(values, 0.95)) else {
        return 0.0;
    };
    let kept: Vec<f64> = values.iter().copied().filter(|v| *v >= lo && *v <= hi).collect();
    if kept.is_empty() { mean(values) } else { mean(&kept) }
}

/// Task 3: mean flat price by street, five most and five least expensive.
pub fn streets(flats: &[Flat]) -> Result<TaskReport> {
    let by_street = group_mean(flats, |f| f.street.clone(), |f| f.price);
    if by_street.is_empty() {
        bail!("no flats with a street");
    }

    let top = top_n(by_street.clone(), 5);
    let bottom = bottom_n(by_street, 5);
    let plain = |s: &str| s.to_string();

    Ok(TaskReport {
        number: 3,
        description: format!(
            "Mean flat price by street.\n\nTop 5 most expensive streets:\n{}\n\nTop 5 cheapest streets:\n{}",
            numbered(&top, plain),
            numbered(&bottom, plain)
        ),
        chart: Chart::stacked(vec![
            Panel::prices("Top 5 most expensive streets (mean flat price)", "Street", bars(&top)),
            Panel::prices("Top 5 cheapest streets (mean flat price)", "Street", bars(&bottom)),
        ]),
    })
}

/// Task 4: mean flat price by floor in buildings with more than one floor.
pub fn floors(flats: &[Flat]) -> Result<TaskReport> {
    let multi_storey: Vec<Flat> = flats
        .iter()
        .filter(|f| f.floors_count.is_some_and(|n| n > 1))
        .cloned()
        .collect();

    let by_floor: Vec<(String, f64)> = group_mean(&multi_storey, |f| f.floor, |f| f.price)
        .into_iter()
        .map(|(floor, price)| (floor.to_string(), price))
        .collect();
    if by_floor.is_empty() {
        bail!("no flats in multi-storey buildings");
    }

    let cheapest = bottom_n(by_floor.clone(), 5);
    let expensive = top_n(by_floor, 5);
    let floor = |s: &str| format!("floor {s}");

    Ok(TaskReport {
        number: 4,
        description: format!(
            "Mean flat price by floor in multi-storey buildings.\n\nMost expensive floors:\n{}\n\nCheapest floors:\n{}",
            numbered(&expensive, floor),
            numbered(&cheapest, floor)
        ),
        chart: Chart::stacked(vec![
            Panel::prices("Top 5 cheapest floors", "Floor", bars(&cheapest)),
            Panel::prices("Top 5 most expensive floors", "Floor", bars(&expensive)),
        ]),
    })
}

/// Task 5: mean price per district and property type, with the price range of
/// each type and the five most expensive districts.
pub fn districts_by_type(flats: &[Flat]) -> Result<TaskReport> {
    let by_pair = group_mean(
        flats,
        |f| Some((f.district.clone()?, f.type_property.clone()?)),
        |f| f.price,
    );
    if by_pair.is_empty() {
        bail!("no flats with both a district and a property type");
    }

    let mut ranges: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for flat in flats {
        if let Some(kind) = &flat.type_property {
            let range = ranges.entry(kind.clone()).or_insert((flat.price, flat.price));
            range.0 = range.0.min(flat.price);
            range.1 = range.1.max(flat.price);
        }
    }

    let type_lines: Vec<String> = ranges
        .iter()
        .map(|(kind, (min, max))| {
            format!("- {kind}: from {} mln to {} mln RUB", millions(*min), millions(*max))
        })
        .collect();
    let legend: Vec<String> = ranges
        .iter()
        .map(|(kind, (min, max))| {
            format!("{kind} (min {} mln, max {} mln)", compact_millions(*min), compact_millions(*max))
        })
        .collect();

    let top_districts = top_n(group_mean(flats, |f| f.district.clone(), |f| f.price), 5);
    let district_lines: Vec<String> = top_districts
        .iter()
        .map(|(district, price)| format!("{district}: {} mln RUB", millions(*price)))
        .collect();

    let chart_bars = by_pair
        .into_iter()
        .map(|((district, kind), price)| Bar::new(format!("{district} / {kind}"), price))
        .collect();

    Ok(TaskReport {
        number: 5,
        description: format!(
            "Mean price by district and property type.\n\nPrice range by property type:\n{}\n\nTop 5 most expensive districts:\n{}",
            type_lines.join("\n"),
            district_lines.join("\n")
        ),
        chart: Chart::single(Panel::prices(
            "Mean flat price by district and property type",
            format!("District / type: {}", legend.join("; ")),
            chart_bars,
        )),
    })
}

/// Task 6: mean price by district against the city-wide mean.
pub fn districts_vs_city(flats: &[Flat]) -> Result<TaskReport> {
    let by_district = group_mean(flats, |f| f.district.clone(), |f| f.price);
    if by_district.is_empty() {
        bail!("no flats with a district");
    }
    let prices: Vec<f64> = flats.iter().map(|f| f.price).collect();
    let city = mean(&prices);

    let above = top_n(by_district.iter().filter(|(_, p)| *p > city).cloned().collect(), 5);
    let below = bottom_n(by_district.iter().filter(|(_, p)| *p <= city).cloned().collect(), 5);

    let above_lines: Vec<String> = above
        .iter()
        .map(|(d, p)| format!("{d}: {} mln RUB (+{} mln)", millions(*p), millions(p - city)))
        .collect();
    let below_lines: Vec<String> = below
        .iter()
        .map(|(d, p)| format!("{d}: {} mln RUB (-{} mln)", millions(*p), millions(city - p)))
        .collect();

    Ok(TaskReport {
        number: 6,
        description: format!(
            "Mean price by district.\nCity mean: {} mln RUB\n\nTop 5 districts above the mean:\n{}\n\nTop 5 districts below the mean:\n{}",
            millions(city),
            above_lines.join("\n"),
            below_lines.join("\n")
        ),
        chart: Chart::single(
            Panel::prices("Mean flat price by district", "District", bars(&by_district))
                .with_reference(format!("City mean: {} RUB", format_price(city)), city),
        ),
    })
}

/// Room category index: studios and unknown counts are `0`, four or more
/// rooms share the last category.
fn room_category(rooms: Option<i64>) -> usize {
    match rooms.unwrap_or(0) {
        n @ 0..=3 => n as usize,
        _ => 4,
    }
}

/// Task 7: mean price by room category. Empty categories show zero.
pub fn rooms(flats: &[Flat]) -> Result<TaskReport> {
    let by_category: BTreeMap<usize, f64> =
        group_mean(flats, |f| Some(room_category(f.rooms_count)), |f| f.price)
            .into_iter()
            .collect();

    let means: Vec<(String, f64)> = ROOM_LABELS
        .iter()
        .enumerate()
        .map(|(i, label)| (label.to_string(), by_category.get(&i).copied().unwrap_or(0.0)))
        .collect();

    let lines: Vec<String> = means
        .iter()
        .map(|(label, price)| format!("- {label}: {} mln RUB", millions(*price)))
        .collect();

    Ok(TaskReport {
        number: 7,
        description: format!(
            "Mean flat price by number of rooms.\nStudios counted as 0 rooms.\n\n{}",
            lines.join("\n")
        ),
        chart: Chart::single(Panel::prices("Mean price by number of rooms", "Rooms", bars(&means))),
    })
}
