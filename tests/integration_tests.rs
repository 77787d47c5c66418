use funding_profile_engine::*;

fn record(date: &str, description: &str, amount: &str) -> RawTransactionRecord {
    RawTransactionRecord {
        date: date.to_string(),
        description: description.to_string(),
        amount: amount.to_string(),
        running_balance: None,
    }
}

fn company(trading_months: u32) -> CompanyInfo {
    CompanyInfo {
        entity_type: EntityType::LimitedCompany,
        time_trading_months: trading_months,
        has_filed_accounts: true,
        insolvency_events: false,
        iva: false,
    }
}

#[test]
fn test_single_statement_end_to_end() {
    // One account, 33 days of data, one ledger balance written "4,500 D",
    // one outflow described as a known lender repayment.
    let account = AccountData {
        transactions: vec![
            record("2024-03-01", "CLIENT INVOICE 1001", "£6,000.00"),
            RawTransactionRecord {
                date: "2024-03-18".to_string(),
                description: "CHEQUE DEPOSIT".to_string(),
                amount: "250.00".to_string(),
                running_balance: Some("4,500 D".to_string()),
            },
            record("2024-04-02", "IWOCA REPAYMENT", "-500.00"),
        ],
        sign_convention: SignConvention::InflowPositive,
        current_balance: None,
        currency_code: Some("GBP".to_string()),
        account_name: None,
    };

    let engine = ProfileEngine::with_defaults();
    let profile = engine.build_profile(&account);

    // 33-day span is a single statement month.
    assert_eq!(profile.average_monthly_income, 6250.0);

    // The single ledger point, debit-suffixed, dominates the balance stats.
    assert_eq!(profile.average_eod_balance, -4500.0);
    assert_eq!(profile.low_balance_day_count, 1);
    assert_eq!(profile.negative_balance_day_count, 1);

    assert_eq!(profile.detected_repayments.count, 1);
    assert_eq!(profile.detected_repayments.total_amount, 500.0);
    assert_eq!(
        profile.detected_repayments.lenders,
        vec!["Iwoca".to_string()]
    );
    assert_eq!(profile.currency_code, "GBP");
}

#[test]
fn test_open_banking_feed_with_outflow_positive_convention() {
    // Plaid-style feed: positive = money out, negative = money in, current
    // balance known, no ledger column.
    let account = AccountData {
        transactions: vec![
            record("2024-06-09", "STRIPE PAYOUT", "-200.00"),
            record("2024-06-05", "RENT", "900.00"),
        ],
        sign_convention: SignConvention::OutflowPositive,
        current_balance: Some(1000.0),
        currency_code: Some("GBP".to_string()),
        account_name: None,
    };

    let engine = ProfileEngine::with_defaults();
    let profile = engine.build_profile(&account);

    // Balance walked back from 1000: before the 200 inflow the account
    // held 800, carried across the gap days.
    assert!(profile.average_eod_balance > 800.0);
    assert_eq!(profile.negative_balance_day_count, 0);

    assert_eq!(profile.detected_card_providers, vec!["Stripe".to_string()]);
    assert_eq!(profile.average_monthly_card_turnover, 200.0);
}

#[test]
fn test_multi_account_aggregation_feeds_matching() {
    let statement_account = AccountData {
        transactions: vec![
            record("2024-01-01", "CLIENT INVOICE", "£30,000.00"),
            record("2024-01-20", "FUNDING CIRCLE REPAYMENT", "-1,200.00"),
            record("2024-02-29", "CLIENT INVOICE", "£14,000.00"),
        ],
        sign_convention: SignConvention::InflowPositive,
        current_balance: Some(5_000.0),
        currency_code: Some("GBP".to_string()),
        account_name: None,
    };
    let card_account = AccountData {
        transactions: vec![
            record("2024-01-03", "WORLDPAY SETTLEMENT", "12,000.00"),
            record("2024-02-28", "WPY SETTLEMENT", "11,000.00"),
        ],
        sign_convention: SignConvention::InflowPositive,
        current_balance: Some(3_000.0),
        currency_code: Some("GBP".to_string()),
        account_name: None,
    };

    let engine = ProfileEngine::with_defaults();
    let outcome = engine.qualify(
        &[statement_account, card_account],
        &company(24),
        &CreditInfo {
            personal_score: Some(720),
            commercial_score: Some(70),
            commercial_band: None,
        },
    );

    let profile = &outcome.profile;
    assert_eq!(profile.detected_repayments.count, 1);
    assert_eq!(profile.detected_card_providers, vec!["Worldpay".to_string()]);
    assert!(profile.average_monthly_card_turnover > 5_000.0);

    // Both engines ran: every panel lender has a decision, in panel order.
    assert_eq!(outcome.decisions.len(), 7);
    let youlend = outcome
        .decisions
        .iter()
        .find(|d| d.lender_id == "youlend")
        .unwrap();
    // Card settlement is present but the Funding Circle repayment blocks it.
    assert!(!youlend.matched);
    assert!(youlend
        .reasons
        .contains(&"Card settlements detected".to_string()));
    assert!(youlend
        .refusal_reasons
        .contains(&"Existing lender repayments detected".to_string()));
}

#[test]
fn test_no_activity_applicant_gets_complete_refusals() {
    let engine = ProfileEngine::with_defaults();
    let outcome = engine.qualify(&[], &company(2), &CreditInfo::default());

    assert_eq!(outcome.profile, ApplicationFinancialProfile::default());

    for decision in &outcome.decisions {
        assert!(!decision.matched);
        assert!(!decision.refusal_reasons.is_empty());
    }

    // Card-only lenders carry the settlement refusal verbatim.
    for id in ["365finance", "youlend"] {
        let decision = outcome
            .decisions
            .iter()
            .find(|d| d.lender_id == id)
            .unwrap();
        assert!(decision
            .refusal_reasons
            .contains(&"No card settlement detected".to_string()));
    }
}

#[test]
fn test_csv_statement_ingestion() -> anyhow::Result<()> {
    let csv_data = "\
date,description,amount,balance
2024-05-01,OPENING BALANCE,0.00,1200.00
2024-05-03,SUMUP SETTLEMENT,850.00,2050.00
2024-05-10,KLARNA INSTALMENT,-75.00,1975.00
2024-05-12,bad-date,not-a-number,
2024-05-20,CLIENT INVOICE 7,1400.00,3375.00
";

    let mut reader = csv::Reader::from_reader(csv_data.as_bytes());
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(RawTransactionRecord {
            date: row.get(0).unwrap_or_default().to_string(),
            description: row.get(1).unwrap_or_default().to_string(),
            amount: row.get(2).unwrap_or_default().to_string(),
            running_balance: row
                .get(3)
                .filter(|v| !v.is_empty())
                .map(|v| v.to_string()),
        });
    }

    let account = AccountData {
        transactions: records,
        sign_convention: SignConvention::InflowPositive,
        current_balance: None,
        currency_code: None,
        account_name: None,
    };

    let engine = ProfileEngine::with_defaults();
    let profile = engine.build_profile(&account);

    // The malformed row is skipped, the opening balance line is excluded
    // from income, and the ledger column drives the balance stats.
    assert_eq!(profile.average_monthly_income, 2250.0);
    assert_eq!(profile.detected_card_providers, vec!["SumUp".to_string()]);
    assert_eq!(
        profile.detected_repayments.lenders,
        vec!["Klarna".to_string()]
    );
    assert_eq!(profile.low_balance_day_count, 0);
    assert!((profile.average_eod_balance - 2150.0).abs() < 1e-9);

    Ok(())
}

#[test]
fn test_custom_panel_and_catalog_configuration() {
    let panel = LenderPanel::from_json(
        r#"{
            "version": 3,
            "lenders": [{
                "id": "acme",
                "name": "Acme Capital",
                "criteria": [
                    { "kind": "min_trading_months", "months": 12 },
                    { "kind": "min_monthly_turnover", "amount": 1000.0 }
                ]
            }]
        }"#,
    )
    .unwrap();

    let config = EngineConfig {
        panel,
        ..EngineConfig::default()
    };
    let engine = ProfileEngine::new(config).unwrap();

    let account = AccountData {
        transactions: vec![record("2024-04-05", "CLIENT INVOICE", "2,500.00")],
        sign_convention: SignConvention::InflowPositive,
        current_balance: None,
        currency_code: None,
        account_name: None,
    };

    let outcome = engine.qualify(&[account], &company(24), &CreditInfo::default());
    assert_eq!(outcome.decisions.len(), 1);
    assert!(outcome.decisions[0].matched);
    assert_eq!(outcome.decisions[0].lender_name, "Acme Capital");
}
