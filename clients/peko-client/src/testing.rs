//! In-memory chain and sink for exercising the client without a node or a wallet

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use cosmwasm_std::{
    from_json, to_json_binary, Addr, BankQuery, Binary, Coin, CosmosMsg, Decimal, Empty,
    QueryRequest, StdError, StdResult, Uint128, WasmMsg, WasmQuery,
};
use cw20::{AllowanceResponse, BalanceResponse, Cw20ExecuteMsg, Cw20QueryMsg, Expiration};
use serde::Serialize;

use peko_pool::adapters::{AssetInfo, Pool, PoolAsset};
use peko_pool::config::{NetworkConfig, SettlePolicy};
use peko_pool::msg::{QueryMsg, UserInfoResponse};

use crate::client::PoolClient;
use crate::error::ClientError;
use crate::notify::{Notification, NotificationSink};
use crate::ports::{ChainReader, ChainWriter, Outcome, TxError, TxHandle};

/// The account every transaction submitted to a `FakeChain` is signed by
pub const WALLET: &str = "alice";

/// What happens to the next transaction awaited
#[derive(Clone, Debug)]
pub enum Scripted {
    Confirm,
    Revert(TxError),
    /// Never included
    Hang,
}

type AllowanceKey = (String, String, String);

struct StagedAllowance {
    key: AllowanceKey,
    amount: Uint128,
    reads_left: u32,
}

#[derive(Default)]
struct ChainState {
    chain_id: String,
    pool: String,
    balances: HashMap<(String, String), Uint128>,
    allowances: HashMap<AllowanceKey, Uint128>,
    user_infos: HashMap<String, UserInfoResponse>,
    outcomes: VecDeque<Scripted>,
    submit_errors: VecDeque<TxError>,
    simulate_error: Option<TxError>,
    submit_calls: usize,
    submissions: Vec<CosmosMsg>,
    pending: HashMap<TxHandle, CosmosMsg>,
    allowance_lag: u32,
    staged: Vec<StagedAllowance>,
}

#[derive(Serialize)]
struct BankBalanceResponse {
    amount: Coin,
}

impl ChainState {
    fn balance(&self, denom: &str, account: &str) -> Uint128 {
        self.balances
            .get(&(denom.to_string(), account.to_string()))
            .copied()
            .unwrap_or_default()
    }

    /// Read an allowance, making a confirmed increase visible once its lag has passed
    fn read_allowance(&mut self, key: AllowanceKey) -> Uint128 {
        if let Some(index) = self.staged.iter().position(|staged| staged.key == key) {
            if self.staged[index].reads_left == 0 {
                let staged = self.staged.remove(index);
                self.allowances.insert(staged.key, staged.amount);
            } else {
                self.staged[index].reads_left -= 1;
            }
        }
        self.allowances.get(&key).copied().unwrap_or_default()
    }

    fn query(&mut self, request: &QueryRequest<Empty>) -> StdResult<Binary> {
        match request {
            QueryRequest::Bank(BankQuery::Balance { address, denom }) => {
                to_json_binary(&BankBalanceResponse {
                    amount: Coin {
                        denom: denom.clone(),
                        amount: self.balance(denom, address),
                    },
                })
            }
            QueryRequest::Wasm(WasmQuery::Smart { contract_addr, msg }) if *contract_addr == self.pool => {
                let QueryMsg::UserInfo { account } = from_json::<QueryMsg>(msg)?;
                to_json_binary(&self.user_infos.get(&account).cloned().unwrap_or_default())
            }
            QueryRequest::Wasm(WasmQuery::Smart { contract_addr, msg }) => match from_json::<Cw20QueryMsg>(msg)? {
                Cw20QueryMsg::Balance { address } => to_json_binary(&BalanceResponse {
                    balance: self.balance(contract_addr, &address),
                }),
                Cw20QueryMsg::Allowance { owner, spender } => to_json_binary(&AllowanceResponse {
                    allowance: self.read_allowance((contract_addr.clone(), owner, spender)),
                    expires: Expiration::Never {},
                }),
                _ => Err(StdError::generic_err("unsupported cw20 query")),
            },
            _ => Err(StdError::generic_err(format!("unsupported query: {:?}", request))),
        }
    }

    fn confirm(&mut self, handle: &TxHandle) {
        let Some(msg) = self.pending.remove(handle) else {
            return;
        };

        if let CosmosMsg::Wasm(WasmMsg::Execute { contract_addr, msg, .. }) = msg {
            if let Ok(Cw20ExecuteMsg::IncreaseAllowance { spender, amount, .. }) = from_json::<Cw20ExecuteMsg>(&msg) {
                let key = (contract_addr, WALLET.to_string(), spender);
                let current = self.allowances.get(&key).copied().unwrap_or_default();
                self.staged.push(StagedAllowance {
                    key,
                    amount: current + amount,
                    reads_left: self.allowance_lag,
                });
            }
        }
    }
}

/// A chain that answers reads from in-memory state and includes transactions as scripted
///
/// Clones share state, so one instance can serve as both reader and writer while the test keeps
/// a handle for inspection.
#[derive(Clone, Default)]
pub struct FakeChain {
    state: Rc<RefCell<ChainState>>,
}

impl FakeChain {
    pub fn new(chain_id: &str, pool: &str) -> Self {
        let chain = FakeChain::default();
        {
            let mut state = chain.state.borrow_mut();
            state.chain_id = chain_id.to_string();
            state.pool = pool.to_string();
        }
        chain
    }

    pub fn set_chain_id(&self, chain_id: &str) {
        self.state.borrow_mut().chain_id = chain_id.to_string();
    }

    pub fn set_balance(&self, info: &AssetInfo, account: &Addr, amount: impl Into<Uint128>) {
        self.state
            .borrow_mut()
            .balances
            .insert((info.get_denom(), account.to_string()), amount.into());
    }

    pub fn set_allowance(&self, token: &AssetInfo, owner: &Addr, spender: &Addr, amount: impl Into<Uint128>) {
        self.state
            .borrow_mut()
            .allowances
            .insert((token.get_denom(), owner.to_string(), spender.to_string()), amount.into());
    }

    /// Allowance as currently stored, ignoring any increase not yet visible
    pub fn allowance(&self, token: &AssetInfo, owner: &Addr, spender: &Addr) -> Uint128 {
        self.state
            .borrow()
            .allowances
            .get(&(token.get_denom(), owner.to_string(), spender.to_string()))
            .copied()
            .unwrap_or_default()
    }

    pub fn set_user_info(&self, account: &Addr, user_info: UserInfoResponse) {
        self.state.borrow_mut().user_infos.insert(account.to_string(), user_info);
    }

    /// Number of allowance reads after its confirmation during which an approval is not yet
    /// reflected
    pub fn set_allowance_lag(&self, reads: u32) {
        self.state.borrow_mut().allowance_lag = reads;
    }

    /// Script the outcome of the next awaited transaction. Unscripted transactions are confirmed
    pub fn push_outcome(&self, outcome: Scripted) {
        self.state.borrow_mut().outcomes.push_back(outcome);
    }

    /// Make the next submission fail, e.g. because the user rejected it in the wallet
    pub fn push_submit_error(&self, err: TxError) {
        self.state.borrow_mut().submit_errors.push_back(err);
    }

    pub fn set_simulate_error(&self, err: Option<TxError>) {
        self.state.borrow_mut().simulate_error = err;
    }

    /// Number of times `submit` was called, whether or not the submission went through
    pub fn submit_count(&self) -> usize {
        self.state.borrow().submit_calls
    }

    /// Messages that were accepted for broadcasting, in order
    pub fn submissions(&self) -> Vec<CosmosMsg> {
        self.state.borrow().submissions.clone()
    }
}

impl ChainReader for FakeChain {
    async fn chain_id(&self) -> StdResult<String> {
        Ok(self.state.borrow().chain_id.clone())
    }

    async fn query(&self, request: &QueryRequest<Empty>) -> StdResult<Binary> {
        self.state.borrow_mut().query(request)
    }

    async fn simulate(&self, _sender: &Addr, _msg: &CosmosMsg) -> Result<(), TxError> {
        match &self.state.borrow().simulate_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl ChainWriter for FakeChain {
    async fn submit(&self, msg: &CosmosMsg) -> Result<TxHandle, TxError> {
        // the wallet prompt; lets other tasks run in the meantime
        tokio::task::yield_now().await;

        let mut state = self.state.borrow_mut();
        state.submit_calls += 1;
        if let Some(err) = state.submit_errors.pop_front() {
            return Err(err);
        }

        state.submissions.push(msg.clone());
        let handle = TxHandle(format!("0x{:064x}", state.submissions.len()));
        state.pending.insert(handle.clone(), msg.clone());
        Ok(handle)
    }

    async fn await_outcome(&self, handle: &TxHandle) -> Outcome {
        tokio::task::yield_now().await;

        let scripted = self.state.borrow_mut().outcomes.pop_front().unwrap_or(Scripted::Confirm);
        match scripted {
            Scripted::Confirm => {
                self.state.borrow_mut().confirm(handle);
                Outcome::Success
            }
            Scripted::Revert(err) => {
                self.state.borrow_mut().pending.remove(handle);
                Outcome::Failure(err)
            }
            Scripted::Hang => std::future::pending().await,
        }
    }
}

/// Keeps every notification for later inspection
#[derive(Clone, Default)]
pub struct RecordingSink {
    notifications: Rc<RefCell<Vec<Notification>>>,
}

impl RecordingSink {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.borrow().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.notifications.borrow_mut().push(notification);
    }
}

/// Pool deployment used across tests: ETH as the native asset, USDC (6 decimals) as the token
pub fn mock_config() -> NetworkConfig {
    NetworkConfig {
        chain_id: "linea-1".to_string(),
        pool: Pool {
            contract_addr: Addr::unchecked("pool"),
        },
        native: PoolAsset {
            symbol: "eth".to_string(),
            name: "Ether".to_string(),
            decimals: 18,
            info: AssetInfo::native("ueth"),
        },
        token: PoolAsset {
            symbol: "usdc".to_string(),
            name: "USD Coin".to_string(),
            decimals: 6,
            info: AssetInfo::cw20(&Addr::unchecked("usdc_token")),
        },
        peko: PoolAsset {
            symbol: "peko".to_string(),
            name: "Peko".to_string(),
            decimals: 18,
            info: AssetInfo::cw20(&Addr::unchecked("peko_token")),
        },
        pay_buffer: Decimal::from_ratio(9999u128, 10000u128),
        settle: SettlePolicy::default(),
        confirmation_timeout_secs: 180,
        peko_shortfall_reason: "Insufficient PEKO balance".to_string(),
    }
}

/// A client for `WALLET`, reading from and writing to `chain`
pub fn mock_client(
    chain: &FakeChain,
    sink: &RecordingSink,
) -> Result<PoolClient<FakeChain, FakeChain, RecordingSink>, ClientError> {
    PoolClient::new(
        chain.clone(),
        chain.clone(),
        sink.clone(),
        mock_config(),
        Addr::unchecked(WALLET),
    )
}
