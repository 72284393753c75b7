//! Fixture-driven setup steps for lending pool integration tests.
//!
//! Every helper resolves its inputs from the session, performs one remote
//! operation and reports whether it succeeded. A missing fixture is an error,
//! a rejected transaction is `Ok(false)`.

use crate::{
    constants::*,
    errors::{Error, Result},
    fixed_point::token_amount,
    interactors::create_lending_interactor,
    network::{FungibleTokenSpec, NetworkProvider},
    services::{create_airdrop_service, create_esdt_interactor, TokenPayment},
    session::{TestSession, TestUser, TokenRecord},
};

pub async fn helper_issue_token<P: NetworkProvider>(
    session: &mut TestSession<P>,
    whale: &TestUser,
    token_breadcrumb_name: &str,
    token_name: &str,
) -> Result<TokenRecord> {
    if session.fixtures().has_token(token_breadcrumb_name) {
        return Err(Error::FixtureExists(token_breadcrumb_name.to_owned()));
    }
    let spec = FungibleTokenSpec {
        name: token_name.to_owned(),
        ticker: token_name.to_owned(),
        decimals: ISSUED_TOKEN_DECIMALS,
        supply: token_amount(ISSUED_TOKEN_SUPPLY_UNITS, ISSUED_TOKEN_DECIMALS),
    };
    let issued_token = create_esdt_interactor(session)
        .issue_fungible_token(whale, &spec)
        .await?;
    session.save_token(token_breadcrumb_name, issued_token.clone())?;
    Ok(issued_token)
}

pub async fn helper_add_liquidity_pool<P: NetworkProvider>(
    session: &mut TestSession<P>,
    whale: &TestUser,
    token_name: &str,
) -> Result<bool> {
    let token = session.load_token(token_name)?;
    let lend_address = session.load_address(LENDING_ADDRESS_FIXTURE)?;
    let pool = session.risk().pool;
    let mut interactor = create_lending_interactor(session, Some(lend_address))?;

    let return_code = interactor
        .add_liquidity_pool(whale, &token.identifier, &pool)
        .await?;
    Ok(return_code.is_success())
}

pub async fn helper_issue_lend_token<P: NetworkProvider>(
    session: &mut TestSession<P>,
    whale: &TestUser,
    token_name: &str,
) -> Result<bool> {
    let token = session.load_token(token_name)?;
    let lend_address = session.load_address(LENDING_ADDRESS_FIXTURE)?;
    let mut interactor = create_lending_interactor(session, Some(lend_address))?;

    let return_code = interactor.issue_lend(whale, &token.identifier).await?;
    Ok(return_code.is_success())
}

pub async fn helper_issue_borrow_token<P: NetworkProvider>(
    session: &mut TestSession<P>,
    whale: &TestUser,
    token_name: &str,
) -> Result<bool> {
    let token = session.load_token(token_name)?;
    let lend_address = session.load_address(LENDING_ADDRESS_FIXTURE)?;
    let mut interactor = create_lending_interactor(session, Some(lend_address))?;

    let return_code = interactor.issue_borrow(whale, &token.identifier).await?;
    Ok(return_code.is_success())
}

pub async fn helper_set_lend_roles<P: NetworkProvider>(
    session: &mut TestSession<P>,
    whale: &TestUser,
    token_name: &str,
) -> Result<bool> {
    let token = session.load_token(token_name)?;
    let lend_address = session.load_address(LENDING_ADDRESS_FIXTURE)?;
    let mut interactor = create_lending_interactor(session, Some(lend_address))?;

    let return_code = interactor.set_lend_roles(whale, &token.identifier).await?;
    Ok(return_code.is_success())
}

pub async fn helper_set_borrow_roles<P: NetworkProvider>(
    session: &mut TestSession<P>,
    whale: &TestUser,
    token_name: &str,
) -> Result<bool> {
    let token = session.load_token(token_name)?;
    let lend_address = session.load_address(LENDING_ADDRESS_FIXTURE)?;
    let mut interactor = create_lending_interactor(session, Some(lend_address))?;

    let return_code = interactor.set_borrow_roles(whale, &token.identifier).await?;
    Ok(return_code.is_success())
}

pub async fn helper_set_asset_loan_to_value<P: NetworkProvider>(
    session: &mut TestSession<P>,
    whale: &TestUser,
    token_name: &str,
) -> Result<bool> {
    let token = session.load_token(token_name)?;
    let lend_address = session.load_address(LENDING_ADDRESS_FIXTURE)?;
    let loan_to_value = session.risk().loan_to_value;
    let mut interactor = create_lending_interactor(session, Some(lend_address))?;

    let return_code = interactor
        .set_asset_loan_to_value(whale, &token.identifier, loan_to_value)
        .await?;
    Ok(return_code.is_success())
}

pub async fn helper_set_asset_liquidation_bonus<P: NetworkProvider>(
    session: &mut TestSession<P>,
    whale: &TestUser,
    token_name: &str,
) -> Result<bool> {
    let token = session.load_token(token_name)?;
    let lend_address = session.load_address(LENDING_ADDRESS_FIXTURE)?;
    let liquidation_bonus = session.risk().liquidation_bonus;
    let mut interactor = create_lending_interactor(session, Some(lend_address))?;

    let return_code = interactor
        .set_asset_liquidation_bonus(whale, &token.identifier, liquidation_bonus)
        .await?;
    Ok(return_code.is_success())
}

/// Syncs the whale, then sends `AIRDROP_UNITS` of the token to both users.
pub async fn helper_airdrop_tokens<P: NetworkProvider>(
    session: &mut TestSession<P>,
    whale: &TestUser,
    first_user: &TestUser,
    second_user: &TestUser,
    token_name: &str,
) -> Result<()> {
    let token = session.load_token(token_name)?;

    session.sync_users(&[whale]).await?;
    let payment =
        TokenPayment::fungible_from_amount(&token.identifier, AIRDROP_UNITS, token.decimals);
    create_airdrop_service(session)
        .send_to_each_user(whale, &[first_user, second_user], &[payment])
        .await
}

pub async fn helper_set_aggregator_for_lp<P: NetworkProvider>(
    session: &mut TestSession<P>,
    whale: &TestUser,
    token_name: &str,
) -> Result<bool> {
    let token = session.load_token(token_name)?;

    let lending_address = session.load_address(LENDING_ADDRESS_FIXTURE)?;
    let price_aggregator_address = session.load_address(PRICE_AGGREGATOR_FIXTURE)?;

    let mut lending_interactor = create_lending_interactor(session, Some(lending_address))?;
    let return_code = lending_interactor
        .set_aggregator(whale, &token.identifier, &price_aggregator_address)
        .await?;

    Ok(return_code.is_success())
}

/// Bootstraps a market for `token_name`: pool, lend/borrow tokens and their
/// roles, risk parameters and, when the fixture exists, the price aggregator.
///
/// Stops at the first step that reports `false`.
pub async fn helper_setup_market<P: NetworkProvider>(
    session: &mut TestSession<P>,
    whale: &TestUser,
    token_name: &str,
) -> Result<bool> {
    let ok = helper_add_liquidity_pool(session, whale, token_name).await?
        && helper_issue_lend_token(session, whale, token_name).await?
        && helper_issue_borrow_token(session, whale, token_name).await?
        && helper_set_lend_roles(session, whale, token_name).await?
        && helper_set_borrow_roles(session, whale, token_name).await?
        && helper_set_asset_loan_to_value(session, whale, token_name).await?
        && helper_set_asset_liquidation_bonus(session, whale, token_name).await?;
    if !ok {
        return Ok(false);
    }

    if session.load_address(PRICE_AGGREGATOR_FIXTURE).is_err() {
        log::info!("no price aggregator fixture, market {token_name} left without oracle");
        return Ok(true);
    }
    helper_set_aggregator_for_lp(session, whale, token_name).await
}
