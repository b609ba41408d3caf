use std::fmt::Display;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};
use std::str::FromStr;
use thiserror::Error;

/// Four-valued truth domain of RV-LTL.
///
/// Values are totally ordered by confidence:
/// `False < PresumablyFalse < PresumablyTrue < True`.
/// Conjunction is the minimum, disjunction is the maximum
/// and negation reflects the order.
///
/// There is deliberately no conversion from [`B4`] to [`bool`]:
/// use [`B4::is_truthy`] or [`B4::is_falsy`], or compare against a specific value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum B4 {
    /// The formula is violated by the observed prefix, whatever comes next.
    False = 1,
    /// The formula would be violated if the trace ended now.
    PresumablyFalse = 2,
    /// The formula would be satisfied if the trace ended now.
    PresumablyTrue = 3,
    /// The formula is satisfied by the observed prefix, whatever comes next.
    True = 4,
}

impl B4 {
    /// All values, from the lowest to the highest.
    pub const ALL: [B4; 4] = [
        B4::False,
        B4::PresumablyFalse,
        B4::PresumablyTrue,
        B4::True,
    ];

    /// `True` or `PresumablyTrue`.
    #[inline(always)]
    pub fn is_truthy(self) -> bool {
        self >= B4::PresumablyTrue
    }

    /// `False` or `PresumablyFalse`.
    #[inline(always)]
    pub fn is_falsy(self) -> bool {
        self <= B4::PresumablyFalse
    }

    /// `True` or `False`, i.e., a verdict no future observation can overturn.
    #[inline(always)]
    pub fn is_definite(self) -> bool {
        matches!(self, B4::True | B4::False)
    }

    /// Conjunction of all the given values (`True` for an empty iterator).
    pub fn all<I: IntoIterator<Item = B4>>(values: I) -> B4 {
        values.into_iter().fold(B4::True, BitAnd::bitand)
    }

    /// Disjunction of all the given values (`False` for an empty iterator).
    pub fn any<I: IntoIterator<Item = B4>>(values: I) -> B4 {
        values.into_iter().fold(B4::False, BitOr::bitor)
    }
}

impl From<bool> for B4 {
    #[inline(always)]
    fn from(value: bool) -> Self {
        if value { B4::True } else { B4::False }
    }
}

impl BitAnd for B4 {
    type Output = B4;

    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self::Output {
        self.min(rhs)
    }
}

impl BitAndAssign for B4 {
    #[inline(always)]
    fn bitand_assign(&mut self, rhs: Self) {
        *self = *self & rhs;
    }
}

impl BitOr for B4 {
    type Output = B4;

    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self::Output {
        self.max(rhs)
    }
}

impl BitOrAssign for B4 {
    #[inline(always)]
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

impl Not for B4 {
    type Output = B4;

    #[inline(always)]
    fn not(self) -> Self::Output {
        match self {
            B4::False => B4::True,
            B4::PresumablyFalse => B4::PresumablyTrue,
            B4::PresumablyTrue => B4::PresumablyFalse,
            B4::True => B4::False,
        }
    }
}

impl Display for B4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            B4::False => "FALSE",
            B4::PresumablyFalse => "PRESUMABLY_FALSE",
            B4::PresumablyTrue => "PRESUMABLY_TRUE",
            B4::True => "TRUE",
        };
        f.write_str(s)
    }
}

/// Error parsing a [`B4`] from its textual representation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("'{0}' is not a four-valued truth value")]
pub struct ParseB4Error(String);

impl FromStr for B4 {
    type Err = ParseB4Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FALSE" => Ok(B4::False),
            "PRESUMABLY_FALSE" => Ok(B4::PresumablyFalse),
            "PRESUMABLY_TRUE" => Ok(B4::PresumablyTrue),
            "TRUE" => Ok(B4::True),
            _ => Err(ParseB4Error(s.to_owned())),
        }
    }
}
