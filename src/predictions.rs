//! Tyre-prediction source: base lap time and degradation per compound for a
//! circuit and its conditions.
//!
//! The engine consumes predictions as a plain list; where they come from is
//! behind [`PredictionSource`]. [`PredictionTable`] serves them from rows
//! loaded via [`crate::storage::load_prediction_table`], picking the row whose
//! (air, track) temperatures are nearest to the query.

use serde::{Deserialize, Serialize};

use crate::types::{PredictionSet, TyrePrediction};

/// Conditions a prediction is requested for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionQuery {
    pub circuit: String,
    pub air_temp: f64,
    pub track_temp: f64,
}

pub trait PredictionSource: Send + Sync {
    /// Predictions for every available compound, or `None` if the source has
    /// nothing for this circuit.
    fn predict(&self, query: &PredictionQuery) -> Option<PredictionSet>;
}

/// One measured or modelled condition point for a circuit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    pub circuit: String,
    pub air_temp: f64,
    pub track_temp: f64,
    pub predictions: Vec<TyrePrediction>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionTable {
    pub rows: Vec<PredictionRow>,
}

impl PredictionTable {
    pub fn new(rows: Vec<PredictionRow>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct circuit names in table order.
    pub fn circuits(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(&row.circuit)) {
                names.push(&row.circuit);
            }
        }
        names
    }
}

impl PredictionSource for PredictionTable {
    fn predict(&self, query: &PredictionQuery) -> Option<PredictionSet> {
        let distance = |row: &PredictionRow| {
            let da = row.air_temp - query.air_temp;
            let dt = row.track_temp - query.track_temp;
            (da * da + dt * dt).sqrt()
        };

        let row = self
            .rows
            .iter()
            .filter(|r| r.circuit.eq_ignore_ascii_case(&query.circuit))
            .min_by(|a, b| distance(a).total_cmp(&distance(b)))?;

        Some(PredictionSet {
            circuit: row.circuit.clone(),
            predictions: row.predictions.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(circuit: &str, air: f64, track: f64, soft_base: f64) -> PredictionRow {
        PredictionRow {
            circuit: circuit.to_string(),
            air_temp: air,
            track_temp: track,
            predictions: vec![
                TyrePrediction::new("SOFT", soft_base, 0.1),
                TyrePrediction::new("HARD", soft_base + 2.0, 0.02),
            ],
        }
    }

    fn table() -> PredictionTable {
        PredictionTable::new(vec![
            row("Bahrain Grand Prix", 25.0, 35.0, 95.0),
            row("Bahrain Grand Prix", 32.0, 48.0, 96.0),
            row("Monaco Grand Prix", 22.0, 40.0, 74.0),
        ])
    }

    fn query(circuit: &str, air: f64, track: f64) -> PredictionQuery {
        PredictionQuery {
            circuit: circuit.to_string(),
            air_temp: air,
            track_temp: track,
        }
    }

    #[test]
    fn test_nearest_conditions_win() {
        let t = table();
        let hot = t.predict(&query("Bahrain Grand Prix", 30.0, 45.0)).unwrap();
        assert_eq!(hot.predictions[0].base_time, 96.0);
        let cool = t.predict(&query("Bahrain Grand Prix", 24.0, 33.0)).unwrap();
        assert_eq!(cool.predictions[0].base_time, 95.0);
    }

    #[test]
    fn test_circuit_match_is_case_insensitive() {
        let set = table().predict(&query("monaco grand prix", 0.0, 0.0)).unwrap();
        assert_eq!(set.circuit, "Monaco Grand Prix");
    }

    #[test]
    fn test_unknown_circuit() {
        assert!(table().predict(&query("Imola", 25.0, 35.0)).is_none());
        assert!(PredictionTable::default().predict(&query("Monaco Grand Prix", 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_circuits() {
        assert_eq!(table().circuits(), vec!["Bahrain Grand Prix", "Monaco Grand Prix"]);
    }
}
