#![allow(dead_code)]

use lending_snippets::{
    config::{GasConfig, RiskConfig},
    constants::{LENDING_ADDRESS_FIXTURE, PRICE_AGGREGATOR_FIXTURE},
    create_lending_interactor,
    fixed_point::token_amount,
    helpers::*,
    FixtureStore, NetworkConfig, NetworkProvider, SimulatedNetwork, TestSession, TestUser,
    TokenRecord,
};
use multiversx_sc::types::Address;

pub const USDC_FIXTURE: &str = "usdc";
pub const USDC_NAME: &str = "USDC";
pub const EGLD_DECIMALS: u32 = 18;

pub struct LendingSnippetsTestState {
    pub session: TestSession<SimulatedNetwork>,
    pub whale: TestUser,
    pub first_user: TestUser,
    pub second_user: TestUser,
    pub lending_address: Address,
    pub price_aggregator_address: Address,
}

impl LendingSnippetsTestState {
    /// Deployed contracts, funded users and both address fixtures saved.
    pub fn new() -> Self {
        let mut state = Self::without_fixtures();
        let lending_address = state.lending_address.clone();
        let price_aggregator_address = state.price_aggregator_address.clone();
        state
            .session
            .save_address(LENDING_ADDRESS_FIXTURE, &lending_address)
            .unwrap();
        state
            .session
            .save_address(PRICE_AGGREGATOR_FIXTURE, &price_aggregator_address)
            .unwrap();
        state
    }

    /// Deployed contracts and funded users, but an empty fixture store.
    pub fn without_fixtures() -> Self {
        let mut network = SimulatedNetwork::new();
        let whale = network.create_user("whale", token_amount(100, EGLD_DECIMALS));
        let first_user = network.create_user("first", token_amount(1, EGLD_DECIMALS));
        let second_user = network.create_user("second", token_amount(1, EGLD_DECIMALS));
        let lending_address = network.deploy_lending_pool(&whale);
        let price_aggregator_address = network.deploy_price_aggregator(&whale);

        let network_config = NetworkConfig::new(network.chain_id(), GasConfig::default());
        let session = TestSession::new(network, FixtureStore::in_memory(), network_config);

        LendingSnippetsTestState {
            session,
            whale,
            first_user,
            second_user,
            lending_address,
            price_aggregator_address,
        }
    }

    pub fn with_risk(self, risk: RiskConfig) -> Self {
        LendingSnippetsTestState {
            session: self.session.with_risk(risk),
            ..self
        }
    }

    pub fn network(&self) -> &SimulatedNetwork {
        self.session.provider()
    }

    pub fn network_mut(&mut self) -> &mut SimulatedNetwork {
        self.session.provider_mut()
    }

    pub async fn issue_usdc(&mut self) -> TokenRecord {
        helper_issue_token(&mut self.session, &self.whale, USDC_FIXTURE, USDC_NAME)
            .await
            .unwrap()
    }

    /// Issues USDC and runs the full market setup for it.
    pub async fn usdc_market(&mut self) -> TokenRecord {
        let token = self.issue_usdc().await;
        assert!(helper_setup_market(&mut self.session, &self.whale, USDC_FIXTURE)
            .await
            .unwrap());
        token
    }

    pub async fn pool_address(&mut self, token: &TokenRecord) -> Address {
        let lending_address = self.lending_address.clone();
        create_lending_interactor(&mut self.session, Some(lending_address))
            .unwrap()
            .pool_address(&token.identifier)
            .await
            .unwrap()
    }
}
