//! FE input-deck rewriting.
//!
//! Replaces built-in cohesive element definitions with a user-element block
//! carrying the cohesive constants, and comments out the cohesive sections
//! those elements were assigned to. Keyword lines are the lines containing
//! `*`; comment lines (containing `**`) are dropped from the output.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{CzmError, Result};

/// Integration points supported by the user element.
pub const INTEGRATION_POINTS: u32 = 4;

const COMMENT: &str = "**";

/// Cohesive-zone constants written into the user-element property line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 6]", into = "[f64; 6]")]
pub struct CohesiveProps {
    pub stiffness: f64,
    pub strength_mode_one: f64,
    pub strength_mode_two: f64,
    pub toughness_mode_one: f64,
    pub toughness_mode_two: f64,
    /// Benzeggagh–Kenane mixed-mode exponent.
    pub bk_exponent: f64,
}

impl From<[f64; 6]> for CohesiveProps {
    fn from(v: [f64; 6]) -> Self {
        Self {
            stiffness: v[0],
            strength_mode_one: v[1],
            strength_mode_two: v[2],
            toughness_mode_one: v[3],
            toughness_mode_two: v[4],
            bk_exponent: v[5],
        }
    }
}

impl From<CohesiveProps> for [f64; 6] {
    fn from(p: CohesiveProps) -> Self {
        [
            p.stiffness,
            p.strength_mode_one,
            p.strength_mode_two,
            p.toughness_mode_one,
            p.toughness_mode_two,
            p.bk_exponent,
        ]
    }
}

impl CohesiveProps {
    /// Property line values: the six constants, then the integration-point count.
    fn property_line(&self) -> Vec<String> {
        let values: [f64; 6] = (*self).into();
        let mut line: Vec<String> = values.iter().map(f64::to_string).collect();
        line.push(INTEGRATION_POINTS.to_string());
        line
    }
}

/// Rewritten deck and the element sets that were converted.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckRewrite {
    pub text: String,
    pub elsets: Vec<String>,
}

/// Redefine every cohesive element block of `deck` as a user element.
pub fn rewrite_cohesive_elements(deck: &str, props: &CohesiveProps) -> Result<DeckRewrite> {
    let mut lines: Vec<String> = deck.split('\n').map(str::to_string).collect();

    // The final line never opens a keyword block.
    let keywords: Vec<usize> = (0..lines.len().saturating_sub(1))
        .filter(|&i| lines[i].contains('*'))
        .collect();
    let element_blocks: Vec<usize> = keywords
        .iter()
        .copied()
        .filter(|&i| lines[i].contains("Element,") && lines[i].contains("type=COH"))
        .collect();
    let sections: Vec<usize> = keywords
        .iter()
        .copied()
        .filter(|&i| lines[i].contains("Cohesive Section,"))
        .collect();

    if element_blocks.is_empty() {
        return Err(CzmError::Deck("no cohesive element definitions found".to_string()));
    }
    if element_blocks.len() != sections.len() {
        return Err(CzmError::Deck(format!(
            "{} cohesive element blocks but {} cohesive sections",
            element_blocks.len(),
            sections.len()
        )));
    }

    let mut elsets = Vec::with_capacity(sections.len());
    for &sec in &sections {
        let elset = lines[sec]
            .split(',')
            .map(str::trim)
            .find(|token| token.starts_with("elset="))
            .ok_or_else(|| CzmError::Deck(format!("cohesive section on line {} has no elset", sec + 1)))?;
        elsets.push(elset.to_string());

        let last = (sec + 1).min(lines.len() - 1);
        for line in &mut lines[sec.saturating_sub(1)..=last] {
            *line = COMMENT.to_string();
        }
    }

    let values = props.property_line();
    let n_props = values.len();
    let props = values.join(",");
    let mut output: Vec<String> = Vec::with_capacity(lines.len() + 5 * element_blocks.len());
    let mut start = 0;
    for (&block, elset) in element_blocks.iter().zip(&elsets) {
        output.extend_from_slice(&lines[start..block]);
        output.extend(user_element_block(elset, &props, n_props));
        start = block + 1;
    }
    output.extend_from_slice(&lines[start..]);

    let text = output
        .into_iter()
        .filter(|line| !line.contains(COMMENT))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(DeckRewrite { text, elsets })
}

fn user_element_block(elset: &str, props: &str, n_props: usize) -> [String; 6] {
    [
        format!("*USER ELEMENT, NODES=8, Type= U1, PROPERTIES={n_props}, COORDINATES=3,"),
        " VARIABLES=21".to_string(),
        " 1, 2, 3".to_string(),
        format!("*UEL PROPERTY, {elset}"),
        format!(" {props}"),
        format!("*ELEMENT, TYPE=U1, {elset}"),
    ]
}

/// Rewrite the deck at `input` and write the result to `output`.
pub fn rewrite_deck_file(input: &Path, output: &Path, props: &CohesiveProps) -> Result<DeckRewrite> {
    let deck = std::fs::read_to_string(input).map_err(|e| CzmError::file(input, e))?;
    let rewrite = rewrite_cohesive_elements(&deck, props)?;
    std::fs::write(output, &rewrite.text).map_err(|e| CzmError::file(output, e))?;
    info!(
        "rewrote {} cohesive element block(s) in '{}' -> '{}'",
        rewrite.elsets.len(),
        input.display(),
        output.display()
    );
    Ok(rewrite)
}
