//! Interactive terminal prompts.
//!
//! Single choices are arrow-key menus. Multiple choices and free text are
//! typed answers; invalid input is reported and asked for again.

use anyhow::{Result, bail};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceError {
    NotANumber,
    OutOfRange { max: usize },
    NothingChosen,
}

impl fmt::Display for ChoiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoiceError::NotANumber => write!(f, "Enter a valid number."),
            ChoiceError::OutOfRange { max } => {
                write!(f, "Invalid number, choose between 1 and {max}. Try again.")
            }
            ChoiceError::NothingChosen => write!(f, "Choose at least one option."),
        }
    }
}

impl std::error::Error for ChoiceError {}

/// Parses a 1-based menu choice into a 0-based index below `count`.
pub fn parse_choice(input: &str, count: usize) -> Result<usize, ChoiceError> {
    let n: usize = input.trim().parse().map_err(|_| ChoiceError::NotANumber)?;
    if n == 0 || n > count {
        return Err(ChoiceError::OutOfRange { max: count });
    }
    Ok(n - 1)
}

/// Parses comma-separated 1-based choices into 0-based indices.
///
/// Entries that are not numbers or are out of range are skipped.
pub fn parse_multi_choice(input: &str, count: usize) -> Vec<usize> {
    input
        .split(',')
        .filter_map(|part| parse_choice(part, count).ok())
        .collect()
}

/// Like [`parse_multi_choice`], but at least one valid entry is required.
pub fn require_multi_choice(input: &str, count: usize) -> Result<Vec<usize>, ChoiceError> {
    let picked = parse_multi_choice(input, count);
    if picked.is_empty() {
        return Err(ChoiceError::NothingChosen);
    }
    Ok(picked)
}

/// Shows `options` as a menu under `title` and returns the chosen one.
pub fn choose<'a, T: fmt::Display>(title: &str, options: &'a [T]) -> Result<&'a T> {
    if options.is_empty() {
        bail!("nothing to choose from for '{title}'");
    }

    let labels: Vec<String> = options.iter().map(|o| o.to_string()).collect();
    let index = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(title)
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(&options[index])
}

/// Lists `options` numbered from 1 and asks for comma-separated numbers
/// until at least one valid choice is typed.
pub fn choose_many<'a, T: fmt::Display>(title: &str, options: &'a [T]) -> Result<Vec<&'a T>> {
    if options.is_empty() {
        bail!("nothing to choose from for '{title}'");
    }

    println!("{title}");
    for (i, option) in options.iter().enumerate() {
        println!("{}. {option}", i + 1);
    }

    let count = options.len();
    let answer: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Enter numbers separated by commas, e.g. 1,2,3")
        .validate_with(move |s: &String| require_multi_choice(s, count).map(|_| ()))
        .interact_text()?;

    let picked = require_multi_choice(&answer, count)?;
    Ok(picked.into_iter().map(|i| &options[i]).collect())
}

/// Asks for a line of text; an empty answer is allowed.
pub fn ask(question: &str) -> Result<String> {
    let answer: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(question)
        .allow_empty(true)
        .interact_text()?;
    Ok(answer)
}
