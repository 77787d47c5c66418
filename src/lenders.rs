//! Evaluates an application against the lender panel. The panel and its
//! criteria are data, loadable from JSON; the evaluation protocol is fixed:
//! every criterion of every rule is evaluated, reasons accumulate on pass,
//! refusals on fail, and a rule matches only when all of its criteria pass.

use crate::catalog::CardProcessorCatalog;
use crate::error::{ProfileError, Result};
use crate::schema::{
    ApplicationFinancialProfile, CommercialBand, CompanyInfo, CreditInfo, LenderDecision,
};
use log::debug;
use serde::{Deserialize, Serialize};

/// Raises the trading-time requirement when the personal score sits below a
/// floor (or is unavailable).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreRelaxation {
    pub below_personal_score: u32,
    pub months: u32,
}

/// One named eligibility criterion. Thresholds pass on exact equality;
/// a missing or zero required numeric input fails with an explicit
/// "not available" refusal rather than passing or erroring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Criterion {
    MinTradingMonths {
        months: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        relaxed: Option<ScoreRelaxation>,
    },
    MinMonthlyTurnover {
        amount: f64,
    },
    MinMonthlyCardTurnover {
        amount: f64,
    },
    RequiresExistingBorrowing,
    MaxExistingLenders {
        count: usize,
    },
    NoExistingLenders,
    MaxLowBalanceDays {
        days: usize,
    },
    MaxNegativeBalanceDays {
        days: usize,
    },
    MinPersonalScore {
        score: u32,
    },
    MinBestScore {
        score: u32,
    },
    MinCommercialBand {
        band: u32,
    },
    RequiresFiledAccounts,
    RequiresCardSettlement,
    NoActiveIva,
    NoInsolvencyEvents,
}

/// One funding provider's rule set. Ordered criteria; the decision reports
/// them in this order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LenderRule {
    pub id: String,
    pub name: String,
    pub criteria: Vec<Criterion>,
}

/// The fixed, ordered panel of lender rules. Configuration, not user data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LenderPanel {
    pub version: u32,
    pub lenders: Vec<LenderRule>,
}

impl LenderPanel {
    pub fn from_json(json: &str) -> Result<Self> {
        let panel: Self = serde_json::from_str(json)?;
        panel.validate()?;
        Ok(panel)
    }

    fn validate(&self) -> Result<()> {
        if self.version == 0 {
            return Err(ProfileError::InvalidPanel(
                "version must be at least 1".to_string(),
            ));
        }
        for rule in &self.lenders {
            if rule.id.trim().is_empty() || rule.name.trim().is_empty() {
                return Err(ProfileError::InvalidPanel(
                    "lender rule with empty id or name".to_string(),
                ));
            }
            if rule.criteria.is_empty() {
                return Err(ProfileError::InvalidPanel(format!(
                    "lender '{}' has no criteria",
                    rule.id
                )));
            }
        }
        Ok(())
    }
}

struct EvalContext<'a> {
    profile: &'a ApplicationFinancialProfile,
    company: &'a CompanyInfo,
    credit: &'a CreditInfo,
    card_settlement: bool,
}

/// Evaluates the whole panel. One decision per rule, criteria never
/// short-circuited: a rule with three failing criteria reports all three.
pub fn match_lenders(
    profile: &ApplicationFinancialProfile,
    company: &CompanyInfo,
    credit: &CreditInfo,
    panel: &LenderPanel,
    card_catalog: &CardProcessorCatalog,
) -> Vec<LenderDecision> {
    let ctx = EvalContext {
        profile,
        company,
        credit,
        card_settlement: has_card_settlement(profile, card_catalog),
    };

    debug!(
        "Evaluating {} lender rules (card settlement: {})",
        panel.lenders.len(),
        ctx.card_settlement
    );

    panel
        .lenders
        .iter()
        .map(|rule| evaluate_rule(rule, &ctx))
        .collect()
}

/// Card settlement evidence: a detected provider resolving against the card
/// catalog, or any observed card turnover.
fn has_card_settlement(
    profile: &ApplicationFinancialProfile,
    catalog: &CardProcessorCatalog,
) -> bool {
    if profile.average_monthly_card_turnover > 0.0 {
        return true;
    }

    profile.detected_card_providers.iter().any(|detected| {
        let detected = detected.trim().to_lowercase();
        catalog.processors.iter().any(|processor| {
            processor.canonical.eq_ignore_ascii_case(&detected)
                || processor
                    .aliases
                    .iter()
                    .any(|alias| detected.contains(alias) || alias.contains(&detected))
        })
    })
}

fn evaluate_rule(rule: &LenderRule, ctx: &EvalContext<'_>) -> LenderDecision {
    let mut reasons = Vec::new();
    let mut refusal_reasons = Vec::new();
    let mut matched = true;

    for criterion in &rule.criteria {
        let (passed, explanation) = evaluate_criterion(criterion, ctx);
        if passed {
            reasons.push(explanation);
        } else {
            matched = false;
            refusal_reasons.push(explanation);
        }
    }

    LenderDecision {
        lender_id: rule.id.clone(),
        lender_name: rule.name.clone(),
        matched,
        reasons,
        refusal_reasons,
    }
}

fn evaluate_criterion(criterion: &Criterion, ctx: &EvalContext<'_>) -> (bool, String) {
    match criterion {
        Criterion::MinTradingMonths { months, relaxed } => {
            let required = match relaxed {
                Some(relaxation)
                    if ctx.credit.personal_score.unwrap_or(0)
                        < relaxation.below_personal_score =>
                {
                    relaxation.months
                }
                _ => *months,
            };
            let trading = ctx.company.time_trading_months;
            if trading >= required {
                (true, format!("Trading for {}m (min {}m)", trading, required))
            } else {
                (
                    false,
                    format!("Trading time {}m < minimum {}m", trading, required),
                )
            }
        }

        Criterion::MinMonthlyTurnover { amount } => {
            let turnover = ctx.profile.average_monthly_income;
            if turnover <= 0.0 {
                (false, "Monthly turnover not available".to_string())
            } else if turnover >= *amount {
                (
                    true,
                    format!("Turnover £{:.0} >= £{:.0}", turnover, amount),
                )
            } else {
                (
                    false,
                    format!("Turnover £{:.0} < £{:.0}", turnover, amount),
                )
            }
        }

        Criterion::MinMonthlyCardTurnover { amount } => {
            let turnover = ctx.profile.average_monthly_card_turnover;
            if turnover <= 0.0 {
                (false, "Card turnover not available".to_string())
            } else if turnover >= *amount {
                (
                    true,
                    format!("Card turnover £{:.0} >= £{:.0}", turnover, amount),
                )
            } else {
                (
                    false,
                    format!("Card turnover £{:.0} < £{:.0}", turnover, amount),
                )
            }
        }

        Criterion::RequiresExistingBorrowing => {
            if ctx.profile.detected_repayments.count > 0 {
                (true, "Has existing active borrowing".to_string())
            } else {
                (false, "No existing active borrowing found".to_string())
            }
        }

        Criterion::MaxExistingLenders { count } => {
            let existing = ctx.profile.detected_repayments.count;
            if existing <= *count {
                (
                    true,
                    format!("Existing lenders ({}) <= {}", existing, count),
                )
            } else {
                (
                    false,
                    format!("Existing lenders ({}) > {}", existing, count),
                )
            }
        }

        Criterion::NoExistingLenders => {
            if ctx.profile.detected_repayments.count == 0 {
                (true, "No existing lender repayments detected".to_string())
            } else {
                (false, "Existing lender repayments detected".to_string())
            }
        }

        Criterion::MaxLowBalanceDays { days } => {
            let observed = ctx.profile.low_balance_day_count;
            if observed <= *days {
                (
                    true,
                    format!("Low balance days ({}) <= {}", observed, days),
                )
            } else {
                (
                    false,
                    format!("Low balance days ({}) > {}", observed, days),
                )
            }
        }

        Criterion::MaxNegativeBalanceDays { days } => {
            let observed = ctx.profile.negative_balance_day_count;
            if observed <= *days {
                (
                    true,
                    format!("Negative balance days ({}) <= {}", observed, days),
                )
            } else {
                (
                    false,
                    format!("Negative balance days ({}) > {}", observed, days),
                )
            }
        }

        Criterion::MinPersonalScore { score } => match ctx.credit.personal_score {
            None | Some(0) => (false, "Personal credit score not available".to_string()),
            Some(personal) if personal >= *score => {
                (true, format!("Personal score {} >= {}", personal, score))
            }
            Some(personal) => (false, format!("Personal score {} < {}", personal, score)),
        },

        Criterion::MinBestScore { score } => {
            let best = ctx
                .credit
                .personal_score
                .unwrap_or(0)
                .max(ctx.credit.commercial_score.unwrap_or(0));
            if best == 0 {
                (false, "Credit score not available".to_string())
            } else if best >= *score {
                (true, format!("Score {} >= {}", best, score))
            } else {
                (false, format!("Score {} < {}", best, score))
            }
        }

        Criterion::MinCommercialBand { band } => match resolve_commercial_band(ctx.credit) {
            None => (false, "Commercial band not available".to_string()),
            Some(observed) if observed >= *band => {
                (true, format!("Commercial band {} >= {}", observed, band))
            }
            Some(observed) => (false, format!("Commercial band {} < {}", observed, band)),
        },

        Criterion::RequiresFiledAccounts => {
            if ctx.company.has_filed_accounts {
                (true, "Accounts filed".to_string())
            } else {
                (false, "No filed accounts".to_string())
            }
        }

        Criterion::RequiresCardSettlement => {
            if ctx.card_settlement {
                (true, "Card settlements detected".to_string())
            } else {
                (false, "No card settlement detected".to_string())
            }
        }

        Criterion::NoActiveIva => {
            if !ctx.company.iva {
                (true, "No active IVA".to_string())
            } else {
                (false, "Active IVA detected".to_string())
            }
        }

        Criterion::NoInsolvencyEvents => {
            if !ctx.company.insolvency_events {
                (true, "No insolvency events".to_string())
            } else {
                (false, "Insolvency event detected".to_string())
            }
        }
    }
}

/// Maps the bureau's commercial band to a numeric index. Labels follow the
/// Delphi wording; a missing or zero band falls back to the commercial score
/// (above 60 implies at least band 3).
fn resolve_commercial_band(credit: &CreditInfo) -> Option<u32> {
    let from_band = match &credit.commercial_band {
        Some(CommercialBand::Index(index)) => Some(*index),
        Some(CommercialBand::Label(label)) => {
            let label = label.to_lowercase();
            if label.contains("minimal") || (label.contains("low") && !label.contains("below")) {
                Some(5)
            } else if label.contains("average") || label.contains("moderate") {
                Some(3)
            } else {
                Some(1)
            }
        }
        None => None,
    };

    match from_band {
        Some(band) if band > 0 => Some(band),
        _ => match credit.commercial_score {
            Some(score) if score > 60 => Some(3),
            _ => from_band.filter(|b| *b > 0),
        },
    }
}

impl Default for LenderPanel {
    fn default() -> Self {
        let lenders = vec![
            LenderRule {
                id: "swiftfund".to_string(),
                name: "Swiftfund".to_string(),
                criteria: vec![
                    Criterion::MinTradingMonths {
                        months: 6,
                        relaxed: Some(ScoreRelaxation {
                            below_personal_score: 650,
                            months: 12,
                        }),
                    },
                    Criterion::MinMonthlyTurnover { amount: 20_000.0 },
                    Criterion::RequiresExistingBorrowing,
                    Criterion::MaxLowBalanceDays { days: 5 },
                    Criterion::NoActiveIva,
                ],
            },
            LenderRule {
                id: "nucleus".to_string(),
                name: "Nucleus".to_string(),
                criteria: vec![
                    Criterion::MinTradingMonths {
                        months: 12,
                        relaxed: None,
                    },
                    Criterion::RequiresFiledAccounts,
                    Criterion::MinCommercialBand { band: 3 },
                    Criterion::NoInsolvencyEvents,
                ],
            },
            LenderRule {
                id: "maxcap".to_string(),
                name: "Maxcap".to_string(),
                criteria: vec![
                    Criterion::MinTradingMonths {
                        months: 9,
                        relaxed: None,
                    },
                    Criterion::MinMonthlyTurnover { amount: 15_000.0 },
                    Criterion::MaxExistingLenders { count: 4 },
                    Criterion::MaxNegativeBalanceDays { days: 8 },
                    Criterion::MinPersonalScore { score: 600 },
                ],
            },
            LenderRule {
                id: "bizcap".to_string(),
                name: "Bizcap".to_string(),
                criteria: vec![
                    Criterion::MinTradingMonths {
                        months: 4,
                        relaxed: None,
                    },
                    Criterion::MinMonthlyTurnover { amount: 12_000.0 },
                ],
            },
            LenderRule {
                id: "sigma".to_string(),
                name: "Sigma Lending".to_string(),
                criteria: vec![
                    Criterion::MinTradingMonths {
                        months: 15,
                        relaxed: None,
                    },
                    // £150k per annum expressed monthly.
                    Criterion::MinMonthlyTurnover { amount: 12_500.0 },
                ],
            },
            LenderRule {
                id: "365finance".to_string(),
                name: "365 Finance".to_string(),
                criteria: vec![
                    Criterion::RequiresCardSettlement,
                    Criterion::MinTradingMonths {
                        months: 6,
                        relaxed: None,
                    },
                    Criterion::MinMonthlyCardTurnover { amount: 10_000.0 },
                    Criterion::NoActiveIva,
                ],
            },
            LenderRule {
                id: "youlend".to_string(),
                name: "YouLend".to_string(),
                criteria: vec![
                    Criterion::RequiresCardSettlement,
                    Criterion::MinTradingMonths {
                        months: 3,
                        relaxed: None,
                    },
                    Criterion::MinMonthlyCardTurnover { amount: 5_000.0 },
                    Criterion::MinBestScore { score: 200 },
                    Criterion::NoExistingLenders,
                    Criterion::NoInsolvencyEvents,
                ],
            },
        ];

        Self {
            version: 1,
            lenders,
        }
    }
}
