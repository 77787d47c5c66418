//! # Funding Profile Engine
//!
//! A library for turning raw bank-account activity (uploaded statements or
//! an open-banking feed) into a normalized financial profile, and for
//! evaluating that profile against a panel of funding-provider rule sets.
//!
//! ## Core Concepts
//!
//! - **Transaction Normalizer**: coerces heterogeneous source records into
//!   one canonical transaction shape (positive = money in)
//! - **Balance Reconstructor**: derives a day-by-day end-of-day balance
//!   series backward from a known current balance
//! - **Month Normalizer**: one fractional month divisor shared by every
//!   "average monthly" metric of a profile
//! - **Entity Detector**: keyword catalogs resolving lender repayments and
//!   card-acquirer settlements to canonical names
//! - **Lender Eligibility**: per-lender criteria evaluated in full, with
//!   traceable reasons and refusal reasons
//!
//! The pipeline is pure and synchronous: no I/O, no shared mutable state,
//! same input always gives the same output. Extraction of records from
//! documents and fetching of open-banking data are external collaborators
//! that feed [`AccountData`] in; email, reports and persistence consume the
//! output.
//!
//! ## Example
//!
//! ```rust,ignore
//! use funding_profile_engine::*;
//!
//! let engine = ProfileEngine::with_defaults();
//! let profile = engine.build_application_profile(&accounts);
//! let decisions = engine.match_lenders(&profile, &company, &credit);
//! for decision in &decisions {
//!     println!("{}: {}", decision.lender_name, decision.matched);
//! }
//! ```

pub mod balance;
pub mod catalog;
pub mod detector;
pub mod error;
pub mod lenders;
pub mod normalizer;
pub mod profile;
pub mod schema;
pub mod utils;

pub use balance::{
    balance_stats, ledger_balance_series, reconstruct_daily_balances, BalanceStats,
    LOW_BALANCE_THRESHOLD,
};
pub use catalog::{CardProcessorCatalog, EntityCatalogs, EntityGroup, LenderCatalog};
pub use detector::{
    detect_card_settlements, detect_repayments, match_card_processor, match_lender,
    CardSettlementScan, LenderMatch,
};
pub use error::{ProfileError, Result};
pub use lenders::{Criterion, LenderPanel, LenderRule, ScoreRelaxation};
pub use normalizer::{normalize_records, parse_amount, parse_date};
pub use profile::{aggregate_profiles, ProfileBuilder};
pub use schema::*;
pub use utils::*;

use log::info;
use serde::{Deserialize, Serialize};

/// Everything the pipeline is configured with, constructed once at process
/// start and passed in explicitly. The engine itself stays pure with respect
/// to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    pub catalogs: EntityCatalogs,
    pub panel: LenderPanel,
    /// Upper bound on the reconstructed balance window, in days.
    pub reconstruction_window_days: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catalogs: EntityCatalogs::default(),
            panel: LenderPanel::default(),
            reconstruction_window_days: 730,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.reconstruction_window_days == 0 {
            return Err(ProfileError::InvalidConfig(
                "reconstruction window must be at least 1 day".to_string(),
            ));
        }
        Ok(())
    }
}

/// The combined outbound shape: one application profile plus the full
/// decision list, ready for the report/email collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualificationOutcome {
    pub profile: ApplicationFinancialProfile,
    pub decisions: Vec<LenderDecision>,
}

/// Entry point holding the immutable configuration. `Send + Sync`; callers
/// may fan out per-applicant work without synchronization.
pub struct ProfileEngine {
    config: EngineConfig,
}

impl ProfileEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_defaults() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// One profile for one account/source.
    pub fn build_profile(&self, account: &AccountData) -> FinancialProfile {
        let builder = ProfileBuilder::new(
            &self.config.catalogs,
            self.config.reconstruction_window_days,
        );
        builder.build(account)
    }

    /// Builds every per-account profile, then folds them into one
    /// application-level profile. All per-account work completes before
    /// aggregation begins.
    pub fn build_application_profile(
        &self,
        accounts: &[AccountData],
    ) -> ApplicationFinancialProfile {
        info!("Building application profile from {} accounts", accounts.len());

        let profiles: Vec<FinancialProfile> = accounts
            .iter()
            .map(|account| self.build_profile(account))
            .collect();

        aggregate_profiles(&profiles)
    }

    /// Evaluates the configured lender panel against one application.
    pub fn match_lenders(
        &self,
        profile: &ApplicationFinancialProfile,
        company: &CompanyInfo,
        credit: &CreditInfo,
    ) -> Vec<LenderDecision> {
        lenders::match_lenders(
            profile,
            company,
            credit,
            &self.config.panel,
            &self.config.catalogs.card_processors,
        )
    }

    /// Full pipeline: accounts in, profile and ranked decision list out.
    pub fn qualify(
        &self,
        accounts: &[AccountData],
        company: &CompanyInfo,
        credit: &CreditInfo,
    ) -> QualificationOutcome {
        let profile = self.build_application_profile(accounts);
        let decisions = self.match_lenders(&profile, company, credit);

        info!(
            "Qualification complete: {}/{} lenders matched",
            decisions.iter().filter(|d| d.matched).count(),
            decisions.len()
        );

        QualificationOutcome { profile, decisions }
    }
}

/// Builds an application profile with the built-in catalogs.
pub fn build_application_profile(accounts: &[AccountData]) -> ApplicationFinancialProfile {
    ProfileEngine::with_defaults().build_application_profile(accounts)
}

/// Evaluates the built-in lender panel against one application.
pub fn match_lenders(
    profile: &ApplicationFinancialProfile,
    company: &CompanyInfo,
    credit: &CreditInfo,
) -> Vec<LenderDecision> {
    ProfileEngine::with_defaults().match_lenders(profile, company, credit)
}
