//! Spring functions for elastic network contacts.
//!
//! A spring maps the current distance between two contacting atoms to a
//! stiffness. Springs are named by a descriptor `name[,p1,p2,...]`; omitted
//! parameters keep their defaults (e.g. `exponential,-1.3`).

use phf::phf_map;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum SpringError {
    #[error("Unknown spring function '{0}'")]
    UnknownFunction(String),
    #[error("Spring '{name}' takes at most {max} parameters, got {given}")]
    TooManyParameters {
        name: &'static str,
        max: usize,
        given: usize,
    },
    #[error("Invalid parameter '{value}' for spring '{name}'")]
    InvalidParameter { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpringKind {
    Distance,
    Constant,
    Exponential,
    DistanceWeight,
    Hca,
}

static SPRING_KINDS: phf::Map<&'static str, SpringKind> = phf_map! {
    "distance" => SpringKind::Distance,
    "constant" => SpringKind::Constant,
    "exponential" => SpringKind::Exponential,
    "distance-weight" => SpringKind::DistanceWeight,
    "hca" => SpringKind::Hca,
};

impl SpringKind {
    fn name(self) -> &'static str {
        match self {
            SpringKind::Distance => "distance",
            SpringKind::Constant => "constant",
            SpringKind::Exponential => "exponential",
            SpringKind::DistanceWeight => "distance-weight",
            SpringKind::Hca => "hca",
        }
    }

    fn defaults(self) -> Spring {
        match self {
            SpringKind::Distance => Spring::Distance { cutoff: 15.0 },
            SpringKind::Constant => Spring::Constant { k: 1.0 },
            SpringKind::Exponential => Spring::Exponential { scale: -2.0 },
            SpringKind::DistanceWeight => Spring::DistanceWeight { power: -2.0 },
            SpringKind::Hca => Spring::Hca {
                rcut: 4.0,
                a: 205.5,
                b: 571.2,
                c: 305.9e3,
                n: 6.0,
            },
        }
    }
}

/// A spring function with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub enum Spring {
    /// Unit stiffness within `cutoff` Angstroms, zero beyond.
    Distance { cutoff: f64 },
    /// The same stiffness `k` for every contact.
    Constant { k: f64 },
    /// `exp(scale * d)`.
    Exponential { scale: f64 },
    /// `d^power`.
    DistanceWeight { power: f64 },
    /// Hinsen's calpha force field: `a*d - b` up to `rcut`, `c * d^-n` beyond.
    Hca {
        rcut: f64,
        a: f64,
        b: f64,
        c: f64,
        n: f64,
    },
}

impl Default for Spring {
    fn default() -> Self {
        SpringKind::Distance.defaults()
    }
}

impl Spring {
    /// Looks a spring up by name and applies `params` over its defaults.
    ///
    /// # Errors
    ///
    /// Fails for unknown names or when more parameters are given than the
    /// spring takes.
    pub fn lookup(name: &str, params: &[f64]) -> Result<Self, SpringError> {
        let kind = SPRING_KINDS
            .get(name.trim())
            .copied()
            .ok_or_else(|| SpringError::UnknownFunction(name.trim().to_string()))?;

        let mut spring = kind.defaults();
        let slots = spring.params_mut();
        if params.len() > slots.len() {
            return Err(SpringError::TooManyParameters {
                name: kind.name(),
                max: slots.len(),
                given: params.len(),
            });
        }
        for (slot, &value) in slots.into_iter().zip(params) {
            *slot = value;
        }
        Ok(spring)
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn kind(&self) -> SpringKind {
        match self {
            Spring::Distance { .. } => SpringKind::Distance,
            Spring::Constant { .. } => SpringKind::Constant,
            Spring::Exponential { .. } => SpringKind::Exponential,
            Spring::DistanceWeight { .. } => SpringKind::DistanceWeight,
            Spring::Hca { .. } => SpringKind::Hca,
        }
    }

    fn params_mut(&mut self) -> Vec<&mut f64> {
        match self {
            Spring::Distance { cutoff } => vec![cutoff],
            Spring::Constant { k } => vec![k],
            Spring::Exponential { scale } => vec![scale],
            Spring::DistanceWeight { power } => vec![power],
            Spring::Hca { rcut, a, b, c, n } => vec![rcut, a, b, c, n],
        }
    }

    pub fn params(&self) -> Vec<f64> {
        let mut copy = *self;
        copy.params_mut().into_iter().map(|p| *p).collect()
    }

    /// Stiffness of a contact whose atoms are `distance` Angstroms apart.
    #[inline]
    pub fn stiffness(&self, distance: f64) -> f64 {
        match *self {
            Spring::Distance { cutoff } => {
                if distance <= cutoff {
                    1.0
                } else {
                    0.0
                }
            }
            Spring::Constant { k } => k,
            Spring::Exponential { scale } => (scale * distance).exp(),
            Spring::DistanceWeight { power } => distance.powf(power),
            Spring::Hca { rcut, a, b, c, n } => {
                if distance <= rcut {
                    a * distance - b
                } else {
                    c * distance.powf(-n)
                }
            }
        }
    }
}

/// Names of all registered spring functions, sorted.
pub fn spring_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = SPRING_KINDS.keys().copied().collect();
    names.sort_unstable();
    names
}

impl FromStr for Spring {
    type Err = SpringError;

    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        let mut parts = descriptor.split(',');
        let name = parts.next().unwrap_or("").trim();
        let kind_name = SPRING_KINDS
            .get(name)
            .map(|k| k.name())
            .ok_or_else(|| SpringError::UnknownFunction(name.to_string()))?;
        let params = parts
            .map(|p| {
                p.trim().parse::<f64>().map_err(|_| SpringError::InvalidParameter {
                    name: kind_name,
                    value: p.trim().to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Spring::lookup(name, &params)
    }
}

impl TryFrom<String> for Spring {
    type Error = SpringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Spring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        for p in self.params() {
            write!(f, ",{}", p)?;
        }
        Ok(())
    }
}

/// The springs used to assemble a Hessian: one for ordinary contacts and,
/// optionally, one for bonded contacts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpringSet {
    pub contact: Spring,
    pub bound: Option<Spring>,
}

impl SpringSet {
    pub fn new(contact: Spring, bound: Option<Spring>) -> Self {
        Self { contact, bound }
    }

    /// The spring for a contact, given whether its atoms are bonded.
    #[inline]
    pub fn for_contact(&self, bonded: bool) -> &Spring {
        match (&self.bound, bonded) {
            (Some(bound), true) => bound,
            _ => &self.contact,
        }
    }
}
