//! Integration-test helpers for the lending protocol.
//!
//! Helpers issue tokens, configure markets on the lending pool and airdrop
//! test funds; the interactors query and administer deployed contracts
//! through their ABI. Chain access goes through a [`NetworkProvider`]: the
//! snippets gateway for real networks, [`SimulatedNetwork`] in tests.

pub mod abi;
pub mod audit;
pub mod codec;
pub mod config;
pub mod constants;
pub mod errors;
pub mod fixed_point;
pub mod gateway;
pub mod helpers;
pub mod interactors;
pub mod network;
pub mod services;
pub mod session;
pub mod simulator;

pub use config::Config;
pub use errors::{Error, Result};
pub use fixed_point::{PoolConfig, Ratio};
pub use gateway::GatewayProvider;
pub use helpers::*;
pub use interactors::{
    create_lending_interactor, create_liquidity_interactor, LendingPoolInteractor,
    LiquidityPoolInteractor,
};
pub use network::{NetworkConfig, NetworkProvider, ReturnCode};
pub use session::{FixtureStore, TestSession, TestUser, TokenRecord};
pub use simulator::SimulatedNetwork;
