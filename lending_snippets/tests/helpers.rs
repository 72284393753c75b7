mod setup;

use lending_snippets::{
    audit::AuditKind,
    config::RiskConfig,
    constants::*,
    create_lending_interactor, create_liquidity_interactor,
    fixed_point::token_amount,
    helpers::*,
    simulator::PoolRoles,
    Error, Ratio,
};
use multiversx_sc_snippets::imports::Bech32Address;
use setup::*;

#[tokio::test]
async fn helpers_fail_before_token_fixture_is_saved() {
    let mut state = LendingSnippetsTestState::new();
    let whale = state.whale.clone();
    let session = &mut state.session;

    let err = helper_add_liquidity_pool(session, &whale, USDC_FIXTURE).await.unwrap_err();
    assert!(matches!(err, Error::MissingToken(name) if name == USDC_FIXTURE));

    assert!(matches!(
        helper_issue_lend_token(session, &whale, USDC_FIXTURE).await,
        Err(Error::MissingToken(_))
    ));
    assert!(matches!(
        helper_issue_borrow_token(session, &whale, USDC_FIXTURE).await,
        Err(Error::MissingToken(_))
    ));
    assert!(matches!(
        helper_set_lend_roles(session, &whale, USDC_FIXTURE).await,
        Err(Error::MissingToken(_))
    ));
    assert!(matches!(
        helper_set_borrow_roles(session, &whale, USDC_FIXTURE).await,
        Err(Error::MissingToken(_))
    ));
    assert!(matches!(
        helper_set_asset_loan_to_value(session, &whale, USDC_FIXTURE).await,
        Err(Error::MissingToken(_))
    ));
    assert!(matches!(
        helper_set_asset_liquidation_bonus(session, &whale, USDC_FIXTURE).await,
        Err(Error::MissingToken(_))
    ));
    assert!(matches!(
        helper_set_aggregator_for_lp(session, &whale, USDC_FIXTURE).await,
        Err(Error::MissingToken(_))
    ));

    let first = state.first_user.clone();
    let second = state.second_user.clone();
    assert!(matches!(
        helper_airdrop_tokens(&mut state.session, &whale, &first, &second, USDC_FIXTURE).await,
        Err(Error::MissingToken(_))
    ));

    // Nothing reached the chain.
    assert_eq!(state.session.audit().count(AuditKind::TransactionSent), 0);
}

#[tokio::test]
async fn helpers_fail_without_lending_address_fixture() {
    let mut state = LendingSnippetsTestState::without_fixtures();
    state.issue_usdc().await;
    let whale = state.whale.clone();

    let err = helper_add_liquidity_pool(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingAddress(name) if name == LENDING_ADDRESS_FIXTURE));

    assert!(matches!(
        helper_issue_lend_token(&mut state.session, &whale, USDC_FIXTURE).await,
        Err(Error::MissingAddress(_))
    ));
    assert!(matches!(
        helper_issue_borrow_token(&mut state.session, &whale, USDC_FIXTURE).await,
        Err(Error::MissingAddress(_))
    ));
}

#[tokio::test]
async fn issued_token_round_trips_through_session() {
    let mut state = LendingSnippetsTestState::new();

    let issued = state.issue_usdc().await;
    let loaded = state.session.load_token(USDC_FIXTURE).unwrap();

    assert_eq!(loaded, issued);
    assert!(loaded.identifier.starts_with("USDC-"));
    assert_eq!(loaded.decimals, ISSUED_TOKEN_DECIMALS);
    assert_eq!(
        state
            .network()
            .token_balance(&state.whale.address, &loaded.identifier),
        token_amount(ISSUED_TOKEN_SUPPLY_UNITS, ISSUED_TOKEN_DECIMALS)
    );
    assert_eq!(state.session.audit().count(AuditKind::TokenIssued), 1);
}

#[tokio::test]
async fn issuing_under_a_saved_fixture_is_refused() {
    let mut state = LendingSnippetsTestState::new();
    let first = state.issue_usdc().await;
    let whale = state.whale.clone();

    let err = helper_issue_token(&mut state.session, &whale, USDC_FIXTURE, "EVIL")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::FixtureExists(name) if name == USDC_FIXTURE));
    assert_eq!(state.session.load_token(USDC_FIXTURE).unwrap(), first);
    assert_eq!(state.session.audit().count(AuditKind::TokenIssued), 1);
}

#[tokio::test]
async fn invalid_ticker_is_rejected() {
    let mut state = LendingSnippetsTestState::new();
    let whale = state.whale.clone();

    let err = helper_issue_token(&mut state.session, &whale, "bad", "usdc")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Rejected(_)));
    assert!(matches!(
        state.session.load_token("bad"),
        Err(Error::MissingToken(_))
    ));
}

#[tokio::test]
async fn add_pool_then_issue_lend_and_borrow_tokens() {
    let mut state = LendingSnippetsTestState::new();
    let token = state.issue_usdc().await;
    let whale = state.whale.clone();

    assert!(helper_add_liquidity_pool(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
    assert!(helper_issue_lend_token(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
    assert!(helper_issue_borrow_token(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());

    let pool_address = state.pool_address(&token).await;
    let mut interactor = create_liquidity_interactor(&mut state.session, Some(pool_address)).unwrap();
    assert_eq!(interactor.get_pool_asset().await.unwrap(), token.identifier);
    assert!(interactor.get_lend_token().await.unwrap().starts_with("LUSDC-"));
    assert!(interactor.get_borrow_token().await.unwrap().starts_with("BUSDC-"));
}

#[tokio::test]
async fn adding_the_same_pool_twice_reports_failure() {
    let mut state = LendingSnippetsTestState::new();
    state.issue_usdc().await;
    let whale = state.whale.clone();

    assert!(helper_add_liquidity_pool(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
    assert!(!helper_add_liquidity_pool(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
}

#[tokio::test]
async fn issue_lend_without_pool_reports_failure() {
    let mut state = LendingSnippetsTestState::new();
    state.issue_usdc().await;
    let whale = state.whale.clone();

    assert!(!helper_issue_lend_token(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
    assert!(!helper_set_asset_loan_to_value(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
}

#[tokio::test]
async fn only_the_owner_can_configure_markets() {
    let mut state = LendingSnippetsTestState::new();
    state.issue_usdc().await;
    let intruder = state.first_user.clone();

    assert!(!helper_add_liquidity_pool(&mut state.session, &intruder, USDC_FIXTURE)
        .await
        .unwrap());
    assert_eq!(state.session.audit().count(AuditKind::TransactionCompleted), 1);
}

#[tokio::test]
async fn roles_require_issued_tokens() {
    let mut state = LendingSnippetsTestState::new();
    let token = state.issue_usdc().await;
    let whale = state.whale.clone();

    assert!(helper_add_liquidity_pool(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
    assert!(!helper_set_lend_roles(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());

    assert!(helper_issue_lend_token(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
    assert!(helper_issue_borrow_token(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
    assert!(helper_set_lend_roles(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
    assert!(helper_set_borrow_roles(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());

    let pool_address = state.pool_address(&token).await;
    assert_eq!(
        state.network().pool_roles(&pool_address),
        Some(PoolRoles {
            lend: true,
            borrow: true
        })
    );
}

#[tokio::test]
async fn risk_parameters_use_fixed_point_defaults() {
    let mut state = LendingSnippetsTestState::new();
    let token = state.issue_usdc().await;
    let whale = state.whale.clone();

    assert!(helper_add_liquidity_pool(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
    assert!(helper_set_asset_loan_to_value(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
    assert!(helper_set_asset_liquidation_bonus(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());

    let lending_address = state.lending_address.clone();
    let mut interactor = create_lending_interactor(&mut state.session, Some(lending_address)).unwrap();
    assert_eq!(
        interactor.get_asset_loan_to_value(&token.identifier).await.unwrap(),
        DEFAULT_LOAN_TO_VALUE.to_string()
    );
    assert_eq!(
        interactor
            .get_asset_liquidation_bonus(&token.identifier)
            .await
            .unwrap(),
        DEFAULT_LIQUIDATION_BONUS.to_string()
    );
}

#[tokio::test]
async fn risk_parameters_follow_session_overrides() {
    let risk = RiskConfig {
        loan_to_value: Ratio::from_percent(60),
        ..RiskConfig::default()
    };
    let mut state = LendingSnippetsTestState::new().with_risk(risk);

    let token = state.issue_usdc().await;
    let whale = state.whale.clone();
    assert!(helper_add_liquidity_pool(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
    assert!(helper_set_asset_loan_to_value(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());

    let lending_address = state.lending_address.clone();
    let ltv = create_lending_interactor(&mut state.session, Some(lending_address))
        .unwrap()
        .get_asset_loan_to_value(&token.identifier)
        .await
        .unwrap();
    assert_eq!(ltv, "600000000");
}

#[tokio::test]
async fn loan_to_value_must_stay_below_liquidation_threshold() {
    let risk = RiskConfig {
        loan_to_value: Ratio::from_raw_units(DEFAULT_LIQUIDATION_THRESHOLD),
        ..RiskConfig::default()
    };
    let mut state = LendingSnippetsTestState::new().with_risk(risk);

    let token = state.issue_usdc().await;
    let whale = state.whale.clone();
    assert!(helper_add_liquidity_pool(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
    assert!(!helper_set_asset_loan_to_value(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());

    let lending_address = state.lending_address.clone();
    let ltv = create_lending_interactor(&mut state.session, Some(lending_address))
        .unwrap()
        .get_asset_loan_to_value(&token.identifier)
        .await
        .unwrap();
    assert_eq!(ltv, "0");
}

#[tokio::test]
async fn liquidation_bonus_requires_a_supported_asset() {
    let mut state = LendingSnippetsTestState::new();
    state.issue_usdc().await;
    let whale = state.whale.clone();

    assert!(!helper_set_asset_liquidation_bonus(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
    assert!(helper_add_liquidity_pool(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
    assert!(helper_set_asset_liquidation_bonus(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
}

#[tokio::test]
async fn aggregator_requires_its_address_fixture() {
    let mut state = LendingSnippetsTestState::without_fixtures();
    let lending_address = state.lending_address.clone();
    state
        .session
        .save_address(LENDING_ADDRESS_FIXTURE, &lending_address)
        .unwrap();
    state.issue_usdc().await;
    let whale = state.whale.clone();

    assert!(helper_add_liquidity_pool(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
    let err = helper_set_aggregator_for_lp(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingAddress(name) if name == PRICE_AGGREGATOR_FIXTURE));
}

#[tokio::test]
async fn aggregator_is_bound_to_the_pool() {
    let mut state = LendingSnippetsTestState::new();
    let token = state.issue_usdc().await;
    let whale = state.whale.clone();

    assert!(helper_add_liquidity_pool(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
    assert!(helper_set_aggregator_for_lp(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());

    let expected = Bech32Address::from(state.price_aggregator_address.clone()).to_bech32_string();
    let pool_address = state.pool_address(&token).await;
    let aggregator = create_liquidity_interactor(&mut state.session, Some(pool_address))
        .unwrap()
        .get_aggregator_address()
        .await
        .unwrap();
    assert_eq!(aggregator, expected);
}

#[tokio::test]
async fn aggregator_must_be_a_contract() {
    let mut state = LendingSnippetsTestState::new();
    let token = state.issue_usdc().await;
    let whale = state.whale.clone();
    state
        .session
        .save_address(PRICE_AGGREGATOR_FIXTURE, &whale.address)
        .unwrap();

    assert!(helper_add_liquidity_pool(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
    assert!(!helper_set_aggregator_for_lp(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());

    let pool_address = state.pool_address(&token).await;
    let aggregator = create_liquidity_interactor(&mut state.session, Some(pool_address))
        .unwrap()
        .get_aggregator_address()
        .await
        .unwrap();
    assert_eq!(
        aggregator,
        Bech32Address::from(multiversx_sc::types::Address::zero()).to_bech32_string()
    );
}

#[tokio::test]
async fn setup_market_runs_every_step() {
    let mut state = LendingSnippetsTestState::new();
    let token = state.usdc_market().await;

    let pool_address = state.pool_address(&token).await;
    assert_eq!(
        state.network().pool_roles(&pool_address),
        Some(PoolRoles {
            lend: true,
            borrow: true
        })
    );

    let expected = Bech32Address::from(state.price_aggregator_address.clone()).to_bech32_string();
    let mut interactor = create_liquidity_interactor(&mut state.session, Some(pool_address)).unwrap();
    assert_eq!(interactor.get_aggregator_address().await.unwrap(), expected);
}

#[tokio::test]
async fn setup_market_stops_at_first_failure() {
    let mut state = LendingSnippetsTestState::new();
    state.usdc_market().await;
    let whale = state.whale.clone();
    let completed = state.session.audit().count(AuditKind::TransactionCompleted);

    // The pool exists already, so the first step fails and nothing else is sent.
    assert!(!helper_setup_market(&mut state.session, &whale, USDC_FIXTURE)
        .await
        .unwrap());
    assert_eq!(
        state.session.audit().count(AuditKind::TransactionCompleted),
        completed + 1
    );
}

#[tokio::test]
async fn airdrop_sends_500_units_to_each_user() {
    let mut state = LendingSnippetsTestState::new();
    let token = state.issue_usdc().await;
    let whale = state.whale.clone();
    let first = state.first_user.clone();
    let second = state.second_user.clone();

    let whale_before = state.network().token_balance(&whale.address, &token.identifier);

    helper_airdrop_tokens(&mut state.session, &whale, &first, &second, USDC_FIXTURE)
        .await
        .unwrap();

    let unit = token_amount(AIRDROP_UNITS, token.decimals);
    let network = state.network();
    assert_eq!(network.token_balance(&first.address, &token.identifier), unit);
    assert_eq!(network.token_balance(&second.address, &token.identifier), unit);
    assert_eq!(
        network.token_balance(&whale.address, &token.identifier),
        whale_before - token_amount(2 * AIRDROP_UNITS, token.decimals)
    );

    assert!(state.session.synced_account(&whale).is_some());
    assert_eq!(state.session.audit().count(AuditKind::AccountsSynced), 1);
    assert_eq!(state.session.audit().count(AuditKind::Airdrop), 1);
}

#[tokio::test]
async fn airdrop_without_funds_is_an_error() {
    let mut state = LendingSnippetsTestState::new();
    let token = state.issue_usdc().await;
    let poor = state.first_user.clone();
    let whale = state.whale.clone();
    let second = state.second_user.clone();

    let err = helper_airdrop_tokens(&mut state.session, &poor, &whale, &second, USDC_FIXTURE)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Rejected(_)));
    assert_eq!(
        state.network().token_balance(&second.address, &token.identifier),
        Default::default()
    );
}
