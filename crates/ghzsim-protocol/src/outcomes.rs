//! Participant streams regrouped by round for post-processing.

use ghzsim_sim::Basis;
use thiserror::Error;

use crate::participant::ParticipantOutput;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutcomeError {
    #[error("no participant outputs to tabulate")]
    Empty,
    #[error("participant {name} has no {stream} stream")]
    MissingStream { name: String, stream: &'static str },
    #[error("participant {name} reported {found} {stream} values, expected {expected}")]
    LengthMismatch {
        name: String,
        stream: &'static str,
        found: usize,
        expected: usize,
    },
}

/// Round-major view of every participant's corrected outcomes.
///
/// `bits(r)[p]` is participant `p`'s outcome in round `r`. When the
/// participants measured in recorded X/Y bases, `bases(r)[p]` holds the
/// matching basis; a table without bases comes from Z-basis rounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeTable {
    participants: Vec<String>,
    bits: Vec<Vec<u8>>,
    bases: Option<Vec<Vec<Basis>>>,
}

impl OutcomeTable {
    /// Tabulate the `outcomes` streams, with `bases` if every participant
    /// recorded them.
    pub fn from_outcomes(outputs: &[ParticipantOutput]) -> Result<Self, OutcomeError> {
        let columns: Vec<&[u8]> = outputs.iter().map(|o| o.outcomes.as_slice()).collect();
        let bases = if outputs.iter().all(|o| o.bases.is_some()) {
            let cols = outputs
                .iter()
                .map(|o| o.bases.as_deref().unwrap_or_default())
                .collect::<Vec<_>>();
            Some(cols)
        } else {
            None
        };
        Self::tabulate(outputs, &columns, bases.as_deref(), "outcomes")
    }

    /// Tabulate the `verification` streams. Verification rounds are measured
    /// in X by every participant.
    pub fn from_verification(outputs: &[ParticipantOutput]) -> Result<Self, OutcomeError> {
        let mut columns = Vec::with_capacity(outputs.len());
        for o in outputs {
            let stream = o
                .verification
                .as_deref()
                .ok_or_else(|| OutcomeError::MissingStream {
                    name: o.name.clone(),
                    stream: "verification",
                })?;
            columns.push(stream);
        }
        let mut table = Self::tabulate(outputs, &columns, None, "verification")?;
        table.bases = Some(vec![vec![Basis::X; outputs.len()]; table.bits.len()]);
        Ok(table)
    }

    fn tabulate(
        outputs: &[ParticipantOutput],
        columns: &[&[u8]],
        bases: Option<&[&[Basis]]>,
        stream: &'static str,
    ) -> Result<Self, OutcomeError> {
        if outputs.is_empty() {
            return Err(OutcomeError::Empty);
        }
        let nr_rounds = columns.first().map_or(0, |c| c.len());
        for (o, col) in outputs.iter().zip(columns) {
            if col.len() != nr_rounds {
                return Err(OutcomeError::LengthMismatch {
                    name: o.name.clone(),
                    stream,
                    found: col.len(),
                    expected: nr_rounds,
                });
            }
        }
        if let Some(bases) = bases {
            for (o, col) in outputs.iter().zip(bases) {
                if col.len() != nr_rounds {
                    return Err(OutcomeError::LengthMismatch {
                        name: o.name.clone(),
                        stream: "bases",
                        found: col.len(),
                        expected: nr_rounds,
                    });
                }
            }
        }
        let bits = (0..nr_rounds)
            .map(|r| columns.iter().map(|c| c[r]).collect())
            .collect();
        let bases =
            bases.map(|cols| (0..nr_rounds).map(|r| cols.iter().map(|c| c[r]).collect()).collect());
        Ok(Self {
            participants: outputs.iter().map(|o| o.name.clone()).collect(),
            bits,
            bases,
        })
    }

    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    pub fn nr_rounds(&self) -> usize {
        self.bits.len()
    }

    pub fn nr_participants(&self) -> usize {
        self.participants.len()
    }

    pub fn bits(&self, round: usize) -> Option<&[u8]> {
        self.bits.get(round).map(Vec::as_slice)
    }

    pub fn bases(&self, round: usize) -> Option<&[Basis]> {
        self.bases.as_ref()?.get(round).map(Vec::as_slice)
    }

    pub fn has_bases(&self) -> bool {
        self.bases.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    fn output(name: &str, outcomes: Vec<u8>, bases: Option<Vec<Basis>>) -> ParticipantOutput {
        ParticipantOutput {
            name: name.into(),
            role: Role::Participant,
            outcomes,
            bases,
            verification: None,
        }
    }

    #[test]
    fn regroups_by_round() {
        let table = OutcomeTable::from_outcomes(&[
            output("C0", vec![0, 1, 1], None),
            output("C1", vec![0, 1, 0], None),
        ])
        .unwrap();
        assert_eq!(table.nr_rounds(), 3);
        assert_eq!(table.nr_participants(), 2);
        assert_eq!(table.bits(2), Some(&[1u8, 0][..]));
        assert!(!table.has_bases());
        assert_eq!(table.bases(0), None);
        assert_eq!(table.bits(3), None);
    }

    #[test]
    fn keeps_bases_when_everyone_recorded_them() {
        let table = OutcomeTable::from_outcomes(&[
            output("C0", vec![0, 1], Some(vec![Basis::X, Basis::Y])),
            output("C1", vec![1, 1], Some(vec![Basis::Y, Basis::Y])),
        ])
        .unwrap();
        assert_eq!(table.bases(0), Some(&[Basis::X, Basis::Y][..]));
        assert_eq!(table.bases(1), Some(&[Basis::Y, Basis::Y][..]));
    }

    #[test]
    fn rejects_ragged_streams() {
        let err = OutcomeTable::from_outcomes(&[
            output("C0", vec![0, 1, 1], None),
            output("C1", vec![0, 1], None),
        ])
        .unwrap_err();
        assert!(matches!(err, OutcomeError::LengthMismatch { found: 2, expected: 3, .. }));
        assert_eq!(OutcomeTable::from_outcomes(&[]).unwrap_err(), OutcomeError::Empty);
    }

    #[test]
    fn verification_table_is_all_x() {
        let mut a = output("C0", vec![0], None);
        let mut b = output("C1", vec![1], None);
        a.verification = Some(vec![1, 0]);
        b.verification = Some(vec![1, 1]);
        let table = OutcomeTable::from_verification(&[a.clone(), b]).unwrap();
        assert_eq!(table.nr_rounds(), 2);
        assert_eq!(table.bases(1), Some(&[Basis::X, Basis::X][..]));

        let err = OutcomeTable::from_verification(&[a, output("C2", vec![], None)]).unwrap_err();
        assert!(matches!(err, OutcomeError::MissingStream { .. }));
    }
}
