use clap::{Parser, Subcommand};
use lending_snippets::{
    constants::{LENDING_ADDRESS_FIXTURE, PRICE_AGGREGATOR_FIXTURE},
    create_lending_interactor, create_liquidity_interactor, helpers, Config, GatewayProvider,
    session::parse_bech32_address, Result, TestSession,
};
use multiversx_sc_snippets::imports::{test_wallets, Address};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rust-interact", about = "Lending pool test snippets")]
struct Cli {
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Issue a fungible token and save it under FIXTURE
    IssueToken { fixture: String, name: String },
    /// Save the lending pool address fixture
    SetLendingAddress { address: String },
    /// Save the price aggregator address fixture
    SetAggregatorAddress { address: String },
    AddLiquidityPool { token: String },
    IssueLend { token: String },
    IssueBorrow { token: String },
    SetLendRoles { token: String },
    SetBorrowRoles { token: String },
    SetLoanToValue { token: String },
    SetLiquidationBonus { token: String },
    SetAggregator { token: String },
    /// Run every market setup step for TOKEN
    SetupMarket { token: String },
    /// Send 500 units of TOKEN to bob and carol
    Airdrop { token: String },
    LendToken { token: String },
    BorrowToken { token: String },
    PoolAsset { token: String },
    PoolParams { token: String },
    AggregatorAddress { token: String },
    Reserves { token: String },
    LiquidationThreshold { token: String },
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        log::error!("{err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.config)?;
    let mut provider = GatewayProvider::new(&config).await;
    let whale = provider.register_user("alice", test_wallets::alice()).await;
    let bob = provider.register_user("bob", test_wallets::bob()).await;
    let carol = provider.register_user("carol", test_wallets::carol()).await;
    let mut session = TestSession::from_config(provider, &config)?;

    match cli.command {
        Command::IssueToken { fixture, name } => {
            let token = helpers::helper_issue_token(&mut session, &whale, &fixture, &name).await?;
            println!("issued: {}", token.identifier);
        }
        Command::SetLendingAddress { address } => {
            let address = parse_bech32_address(&address)?;
            session.save_address(LENDING_ADDRESS_FIXTURE, &address)?;
        }
        Command::SetAggregatorAddress { address } => {
            let address = parse_bech32_address(&address)?;
            session.save_address(PRICE_AGGREGATOR_FIXTURE, &address)?;
        }
        Command::AddLiquidityPool { token } => {
            report(helpers::helper_add_liquidity_pool(&mut session, &whale, &token).await?)
        }
        Command::IssueLend { token } => {
            report(helpers::helper_issue_lend_token(&mut session, &whale, &token).await?)
        }
        Command::IssueBorrow { token } => {
            report(helpers::helper_issue_borrow_token(&mut session, &whale, &token).await?)
        }
        Command::SetLendRoles { token } => {
            report(helpers::helper_set_lend_roles(&mut session, &whale, &token).await?)
        }
        Command::SetBorrowRoles { token } => {
            report(helpers::helper_set_borrow_roles(&mut session, &whale, &token).await?)
        }
        Command::SetLoanToValue { token } => {
            report(helpers::helper_set_asset_loan_to_value(&mut session, &whale, &token).await?)
        }
        Command::SetLiquidationBonus { token } => report(
            helpers::helper_set_asset_liquidation_bonus(&mut session, &whale, &token).await?,
        ),
        Command::SetAggregator { token } => {
            report(helpers::helper_set_aggregator_for_lp(&mut session, &whale, &token).await?)
        }
        Command::SetupMarket { token } => {
            report(helpers::helper_setup_market(&mut session, &whale, &token).await?)
        }
        Command::Airdrop { token } => {
            helpers::helper_airdrop_tokens(&mut session, &whale, &bob, &carol, &token).await?;
            println!("airdrop sent to {} and {}", bob.name, carol.name);
        }
        Command::LendToken { token } => {
            let pool = pool_address(&mut session, &token).await?;
            let value = create_liquidity_interactor(&mut session, Some(pool))?
                .get_lend_token()
                .await?;
            println!("Result: {value}");
        }
        Command::BorrowToken { token } => {
            let pool = pool_address(&mut session, &token).await?;
            let value = create_liquidity_interactor(&mut session, Some(pool))?
                .get_borrow_token()
                .await?;
            println!("Result: {value}");
        }
        Command::PoolAsset { token } => {
            let pool = pool_address(&mut session, &token).await?;
            let value = create_liquidity_interactor(&mut session, Some(pool))?
                .get_pool_asset()
                .await?;
            println!("Result: {value}");
        }
        Command::PoolParams { token } => {
            let pool = pool_address(&mut session, &token).await?;
            let value = create_liquidity_interactor(&mut session, Some(pool))?
                .get_pool_params()
                .await?;
            println!("Result: {value}");
        }
        Command::AggregatorAddress { token } => {
            let pool = pool_address(&mut session, &token).await?;
            let value = create_liquidity_interactor(&mut session, Some(pool))?
                .get_aggregator_address()
                .await?;
            println!("Result: {value}");
        }
        Command::Reserves { token } => {
            let pool = pool_address(&mut session, &token).await?;
            let value = create_liquidity_interactor(&mut session, Some(pool))?
                .get_reserves()
                .await?;
            println!("Result: {value}");
        }
        Command::LiquidationThreshold { token } => {
            let pool = pool_address(&mut session, &token).await?;
            let value = create_liquidity_interactor(&mut session, Some(pool))?
                .get_liquidation_threshold()
                .await?;
            println!("Result: {value}");
        }
    }
    Ok(())
}

fn report(success: bool) {
    println!("success: {success}");
}

/// Liquidity pool of the token saved under `token_fixture`.
async fn pool_address(
    session: &mut TestSession<GatewayProvider>,
    token_fixture: &str,
) -> Result<Address> {
    let token = session.load_token(token_fixture)?;
    let lending_address = session.load_address(LENDING_ADDRESS_FIXTURE)?;
    create_lending_interactor(session, Some(lending_address))?
        .pool_address(&token.identifier)
        .await
}

