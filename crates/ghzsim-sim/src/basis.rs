use serde::{Deserialize, Serialize};

/// Single-qubit measurement basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Basis {
    Z,
    X,
    Y,
}

impl Basis {
    /// Label used by basis-randomised protocols, where X is 0 and Y is 1.
    ///
    /// The sum of labels over all participants counts the Y measurements in
    /// a round, which fixes the expected GHZ parity. Z has no label.
    pub fn label(self) -> Option<u8> {
        match self {
            Basis::X => Some(0),
            Basis::Y => Some(1),
            Basis::Z => None,
        }
    }

    /// Inverse of [`Basis::label`]; any odd value maps to Y.
    pub fn from_label(label: u8) -> Basis {
        if label & 1 == 0 {
            Basis::X
        } else {
            Basis::Y
        }
    }
}

impl std::fmt::Display for Basis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Basis::Z => "Z",
            Basis::X => "X",
            Basis::Y => "Y",
        };
        f.write_str(name)
    }
}
