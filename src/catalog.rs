//! Versioned keyword catalogs backing the entity detector. The built-in
//! defaults cover the UK lender and card-acquirer landscape; deployments can
//! load replacements from JSON without touching the detection or decision
//! logic.

use crate::error::{ProfileError, Result};
use serde::{Deserialize, Serialize};

/// One detectable entity: a canonical display name plus the lower-cased
/// aliases that identify it in a transaction description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityGroup {
    pub canonical: String,
    pub aliases: Vec<String>,
}

fn group(canonical: &str, aliases: &[&str]) -> EntityGroup {
    EntityGroup {
        canonical: canonical.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    }
}

/// Catalog of repayment vocabulary: generic terms that suggest any borrowing,
/// plus specific lender brands that resolve to a canonical name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LenderCatalog {
    pub version: u32,
    pub generic_terms: Vec<String>,
    pub lenders: Vec<EntityGroup>,
}

/// Catalog of card-payment acquirers whose settlement credits indicate card
/// turnover.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardProcessorCatalog {
    pub version: u32,
    pub processors: Vec<EntityGroup>,
}

impl LenderCatalog {
    pub fn from_json(json: &str) -> Result<Self> {
        let mut catalog: Self = serde_json::from_str(json)?;
        catalog.normalize();
        catalog.validate()?;
        Ok(catalog)
    }

    fn normalize(&mut self) {
        for term in &mut self.generic_terms {
            *term = term.trim().to_lowercase();
        }
        for lender in &mut self.lenders {
            for alias in &mut lender.aliases {
                *alias = alias.trim().to_lowercase();
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.version == 0 {
            return Err(ProfileError::InvalidCatalog(
                "version must be at least 1".to_string(),
            ));
        }
        for lender in &self.lenders {
            if lender.canonical.trim().is_empty() {
                return Err(ProfileError::InvalidCatalog(
                    "lender entry with empty canonical name".to_string(),
                ));
            }
            if lender.aliases.iter().all(|a| a.is_empty()) {
                return Err(ProfileError::InvalidCatalog(format!(
                    "lender '{}' has no usable aliases",
                    lender.canonical
                )));
            }
        }
        Ok(())
    }
}

impl CardProcessorCatalog {
    pub fn from_json(json: &str) -> Result<Self> {
        let mut catalog: Self = serde_json::from_str(json)?;
        catalog.normalize();
        catalog.validate()?;
        Ok(catalog)
    }

    fn normalize(&mut self) {
        for processor in &mut self.processors {
            for alias in &mut processor.aliases {
                *alias = alias.trim().to_lowercase();
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.version == 0 {
            return Err(ProfileError::InvalidCatalog(
                "version must be at least 1".to_string(),
            ));
        }
        for processor in &self.processors {
            if processor.canonical.trim().is_empty() {
                return Err(ProfileError::InvalidCatalog(
                    "processor entry with empty canonical name".to_string(),
                ));
            }
            if processor.aliases.iter().all(|a| a.is_empty()) {
                return Err(ProfileError::InvalidCatalog(format!(
                    "processor '{}' has no usable aliases",
                    processor.canonical
                )));
            }
        }
        Ok(())
    }
}

/// Both catalogs bundled, as the pipeline consumes them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityCatalogs {
    pub lenders: LenderCatalog,
    pub card_processors: CardProcessorCatalog,
}

impl Default for EntityCatalogs {
    fn default() -> Self {
        Self {
            lenders: LenderCatalog::default(),
            card_processors: CardProcessorCatalog::default(),
        }
    }
}

impl Default for LenderCatalog {
    fn default() -> Self {
        let generic_terms = [
            "loan",
            "repayment",
            "instalment",
            "installment",
            "instlmnt",
            "emi",
            "credit",
            "finance",
            "financing",
            "lending",
            "capital",
            "advance",
            "agreement",
            "settlement",
            "debt",
            "borrow",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let lenders = vec![
            group("Iwoca", &["iwoca"]),
            group("Funding Circle", &["funding circle"]),
            group("YouLend", &["youlend"]),
            group("Libis", &["libis"]),
            group("Fleximize", &["fleximize"]),
            group("Esme Loans", &["esme loans"]),
            group("MarketFinance", &["marketfinance"]),
            group("ThinCats", &["thincats"]),
            group("Capify", &["capify"]),
            group("Worldpay Advance", &["worldpay advance"]),
            group("Tide Cashflow", &["tide cashflow"]),
            group("Nucleus Commercial Finance", &["nucleus commercial finance"]),
            group("Boost Capital", &["boost capital"]),
            group("Just Cashflow", &["just cashflow"]),
            group("365 Finance", &["365 finance"]),
            group("Lombard", &["lombard"]),
            group("Bibby", &["bibby"]),
            group("White Oak", &["white oak"]),
            group("Ultimate Finance", &["ultimate finance"]),
            group("Shawbrook", &["shawbrook"]),
            group("Allica", &["allica"]),
            group("Close Brothers", &["close brothers"]),
            group("Paragon", &["paragon"]),
            group("Metro Bank Loan", &["metro bank business loan", "metro bank loan"]),
            group("HSBC Loan", &["hsbc business loan", "hsbc loan"]),
            group("Barclays Loan", &["barclays business loan", "barclays loan"]),
            group("Lloyds Loan", &["lloyds business loan", "lloyds loan"]),
            group("NatWest Loan", &["natwest business loan", "natwest loan"]),
            group("Santander Loan", &["santander business loan", "santander loan"]),
            group("TSB Loan", &["tsb loan"]),
            group("Zopa", &["zopa"]),
            group("RateSetter", &["ratesetter", "rate setter"]),
            group("Amigo", &["amigo"]),
            group("Koyo", &["koyo"]),
            group("118 118 Money", &["118 118 money"]),
            group("Oakbrook", &["oakbrook"]),
            group("Drafty", &["drafty"]),
            group("Lending Stream", &["lending stream"]),
            group("Sunny", &["sunny"]),
            group("Satsuma", &["satsuma"]),
            group("Peachy", &["peachy"]),
            group("Everyday Loans", &["everyday loans"]),
            group("Novuna", &["novuna"]),
            group("Creation Finance", &["creation finance"]),
            group("MBNA", &["mbna"]),
            group("Tesco Bank Loan", &["tesco bank loan"]),
            group("Virgin Money Loan", &["virgin money loan"]),
            group("Halifax Loan", &["halifax loan"]),
            group("Klarna", &["klarna"]),
            group("Clearpay", &["clearpay"]),
            group("Laybuy", &["laybuy"]),
            group("PayPal Credit", &["paypal credit", "paypal pay in 3"]),
            group("Monzo Flex", &["monzo flex"]),
            group("Barclaycard", &["barclaycard"]),
            group("Capital One", &["capital one"]),
            group("Aqua Card", &["aqua card"]),
            group("Vanquis", &["vanquis"]),
            group("NewDay", &["newday"]),
            group("Marbles", &["marbles"]),
            group("Fluid Card", &["fluid card"]),
            group("Black Horse", &["black horse"]),
            group("Hitachi Capital", &["hitachi capital"]),
            group("Close Motor Finance", &["close motor"]),
            group("Alphera", &["alphera"]),
            group("Lex Autolease", &["lex autolease"]),
            group("Arval", &["arval"]),
            group("VW Finance", &["vw finance"]),
            group("BMW Finance", &["bmw finance"]),
            group("Mercedes Finance", &["mercedes finance"]),
            group("QuickQuid", &["quickquid"]),
            group("Wonga", &["wonga"]),
            group("Cashfloat", &["cashfloat"]),
            group("MyJar", &["myjar"]),
            group("SafetyNet Credit", &["safety net credit"]),
        ];

        Self {
            version: 1,
            generic_terms,
            lenders,
        }
    }
}

impl Default for CardProcessorCatalog {
    fn default() -> Self {
        let processors = vec![
            group("Worldpay", &["worldpay", "world pay", "wpy", "vantiv"]),
            group("Barclaycard", &["barclaycard", "bcl card serv"]),
            group("Elavon", &["elavon", "elavon fin serv"]),
            group("Global Payments", &["global payments", "gpuk"]),
            group("First Data", &["first data", "fdms", "fis"]),
            group("Dojo", &["dojo"]),
            group("Teya", &["teya", "teya payments", "teya settlement"]),
            group("SumUp", &["sumup"]),
            group("Square", &["square", "squareup"]),
            group("Zettle", &["izettle", "zettle"]),
            group("Viva Wallet", &["viva wallet"]),
            group("Lloyds Cardnet", &["lloyds cardnet", "cardnet"]),
            group("BOS Cardnet", &["bos cardnet"]),
            group("AIB Merchant Services", &["aib ms", "aib merchant services"]),
            group("Paymentsense", &["paymentsense"]),
            group("Handepay", &["handepay"]),
            group("Takepayments", &["takepayments"]),
            group("EVO Payments", &["evo payments"]),
            group("TSYS", &["tsys"]),
            group("Stripe", &["stripe"]),
            group("PayPal", &["paypal"]),
            group("Adyen", &["adyen"]),
            group("Checkout.com", &["checkout.com"]),
        ];

        Self {
            version: 1,
            processors,
        }
    }
}
