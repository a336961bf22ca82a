//! Target payoff catalogue.
//!
//! Targets are closed-form payoff shapes that can be sampled on any grid: the fit
//! grid for calibration and the (finer) evaluation grid for plots.
//!
//! On the CLI a target is written as `name[:param[:param]]`, e.g. `showcase`,
//! `straddle:100`, `call-spread:90:110`, `digital:100:10`.

use std::f64::consts::PI;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{Grid, TargetPayoff};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TargetSpec {
    /// Piecewise payoff used in the paper: linear wing, sine hump, power decay, flat
    /// tail, all shifted up by 15.
    Showcase,
    /// `|S - K|`
    Straddle { strike: f64 },
    /// `min(max(S - lower, 0), upper - lower)`
    CallSpread { lower: f64, upper: f64 },
    /// Pays `amount` when `S >= strike`.
    Digital { strike: f64, amount: f64 },
}

impl TargetSpec {
    pub fn eval(&self, s: f64) -> f64 {
        match *self {
            TargetSpec::Showcase => showcase(s),
            TargetSpec::Straddle { strike } => (s - strike).abs(),
            TargetSpec::CallSpread { lower, upper } => (s - lower).max(0.0).min(upper - lower),
            TargetSpec::Digital { strike, amount } => {
                if s >= strike {
                    amount
                } else {
                    0.0
                }
            }
        }
    }

    pub fn sample(&self, grid: &Grid) -> TargetPayoff {
        TargetPayoff::from_fn(grid, |s| self.eval(s))
    }

    pub fn display_name(&self) -> String {
        match *self {
            TargetSpec::Showcase => "showcase".to_string(),
            TargetSpec::Straddle { strike } => format!("straddle:{strike}"),
            TargetSpec::CallSpread { lower, upper } => format!("call-spread:{lower}:{upper}"),
            TargetSpec::Digital { strike, amount } => format!("digital:{strike}:{amount}"),
        }
    }
}

fn showcase(s: f64) -> f64 {
    let body = if s < 80.0 {
        0.5 * (s - 70.0)
    } else if s < 100.0 {
        ((s - 80.0) / 20.0 * PI).sin() * 10.0 + 5.0
    } else if s < 120.0 {
        0.8 * (120.0 - s).powf(1.5)
    } else {
        0.0
    };
    body + 15.0
}

impl FromStr for TargetSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let name = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        let params: Vec<f64> = parts
            .map(|p| {
                p.trim()
                    .parse::<f64>()
                    .map_err(|e| format!("Invalid target parameter '{p}': {e}"))
            })
            .collect::<Result<_, _>>()?;

        let expect = |n: usize| -> Result<(), String> {
            if params.len() == n {
                Ok(())
            } else {
                Err(format!("Target '{name}' takes {n} parameter(s), got {}.", params.len()))
            }
        };

        match name.as_str() {
            "showcase" => {
                expect(0)?;
                Ok(TargetSpec::Showcase)
            }
            "straddle" => {
                expect(1)?;
                Ok(TargetSpec::Straddle { strike: params[0] })
            }
            "call-spread" => {
                expect(2)?;
                if params[1] <= params[0] {
                    return Err("call-spread requires lower < upper.".to_string());
                }
                Ok(TargetSpec::CallSpread {
                    lower: params[0],
                    upper: params[1],
                })
            }
            "digital" => {
                expect(2)?;
                Ok(TargetSpec::Digital {
                    strike: params[0],
                    amount: params[1],
                })
            }
            other => Err(format!(
                "Unknown target '{other}' \
                 (expected showcase, straddle:K, call-spread:K1:K2, digital:K:AMOUNT)."
            )),
        }
    }
}
