//! Chain server and wallet method partitions
//!
//! Each partition is a separate registry sealed on first use. The command set
//! here is a representative slice; a node registers its full catalog the same
//! way during startup.

use crate::{
    rpc_command, string_enum_field,
    variant::{AllowHighFeesOrMaxFeeRate, DescriptorRange},
    Registry, RegistryBuilder, RegistryConfig, UsageFlags,
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `addnode` sub-command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddNodeSubCmd {
    Add,
    Remove,
    OneTry,
}

string_enum_field!(AddNodeSubCmd);

/// `node` sub-command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeSubCmd {
    Connect,
    Remove,
    Disconnect,
}

string_enum_field!(NodeSubCmd);

rpc_command! {
    pub struct AddNodeCmd {
        pub addr: String,
        pub sub_cmd: AddNodeSubCmd,
    }
}

rpc_command! {
    pub struct NodeCmd {
        pub sub_cmd: NodeSubCmd,
        pub target: String,
        pub connect_sub_cmd: Option<String> = "temp",
    }
}

rpc_command! {
    pub struct GetBlockCountCmd {}
}

rpc_command! {
    pub struct GetBlockCmd {
        pub hash: String,
        pub verbosity: Option<i32> = 1,
    }
}

rpc_command! {
    pub struct GetBlockHashCmd {
        pub index: i64,
    }
}

rpc_command! {
    pub struct GetRawTransactionCmd {
        pub txid: String,
        pub verbose: Option<i32> = 0,
    }
}

rpc_command! {
    pub struct GetNetworkHashPsCmd {
        pub blocks: Option<i32> = 120,
        pub height: Option<i32> = -1,
    }
}

rpc_command! {
    pub struct SendRawTransactionCmd {
        pub hex_tx: String,
        pub fee_setting: Option<AllowHighFeesOrMaxFeeRate> = false,
    }
}

rpc_command! {
    pub struct DeriveAddressesCmd {
        pub descriptor: String,
        pub range: Option<DescriptorRange>,
    }
}

rpc_command! {
    pub struct SearchRawTransactionsCmd {
        pub address: String,
        pub verbose: Option<i32> = 1,
        pub skip: Option<i32> = 0,
        pub count: Option<i32> = 100,
        pub vin_extra: Option<i32> = 0,
        pub reverse: Option<bool> = false,
        pub filter_addrs: Option<Vec<String>>,
    }
}

rpc_command! {
    /// Websocket notification sent when a block is attached to the main chain
    pub struct BlockConnectedNtfn {
        pub hash: String,
        pub height: i32,
        pub time: i64,
    }
}

rpc_command! {
    pub struct GetBalanceCmd {
        pub account: Option<String>,
        pub min_conf: Option<i32> = 1,
    }
}

rpc_command! {
    pub struct ListUnspentCmd {
        pub min_conf: Option<i32> = 1,
        pub max_conf: Option<i32> = 9_999_999,
        pub addresses: Option<Vec<String>>,
    }
}

rpc_command! {
    pub struct SendManyCmd {
        pub from_account: String,
        pub amounts: HashMap<String, f64>,
        pub min_conf: Option<i32> = 1,
        pub comment: Option<String>,
    }
}

rpc_command! {
    pub struct SendToAddressCmd {
        pub address: String,
        pub amount: f64,
        pub comment: Option<String>,
        pub comment_to: Option<String>,
    }
}

rpc_command! {
    pub struct WalletPassphraseCmd {
        pub passphrase: String,
        pub timeout: i64,
    }
}

fn chain_server_registry() -> Registry {
    let mut builder = RegistryBuilder::with_config(RegistryConfig {
        partition: "chainsvr".to_string(),
        ..RegistryConfig::default()
    });
    let ws_ntfn = UsageFlags::WEBSOCKET_ONLY | UsageFlags::NOTIFICATION;
    builder
        .must_register_with_description::<AddNodeCmd>(
            "addnode",
            UsageFlags::NONE,
            "Attempts to add or remove a persistent peer.",
        )
        .must_register_with_description::<NodeCmd>(
            "node",
            UsageFlags::NONE,
            "Attempts to add or remove a peer.",
        )
        .must_register_with_description::<GetBlockCountCmd>(
            "getblockcount",
            UsageFlags::NONE,
            "Returns the number of blocks in the longest block chain.",
        )
        .must_register_with_description::<GetBlockCmd>(
            "getblock",
            UsageFlags::NONE,
            "Returns information about a block given its hash.",
        )
        .must_register_with_description::<GetBlockHashCmd>(
            "getblockhash",
            UsageFlags::NONE,
            "Returns hash of the block in best block chain at the given height.",
        )
        .must_register_with_description::<GetRawTransactionCmd>(
            "getrawtransaction",
            UsageFlags::NONE,
            "Returns information about a transaction given its hash.",
        )
        .must_register_with_description::<GetNetworkHashPsCmd>(
            "getnetworkhashps",
            UsageFlags::NONE,
            "Returns the estimated network hashes per second for the block heights provided by the parameters.",
        )
        .must_register_with_description::<SendRawTransactionCmd>(
            "sendrawtransaction",
            UsageFlags::NONE,
            "Submits the serialized, hex-encoded transaction to the local peer and relays it to the network.",
        )
        .must_register_with_description::<DeriveAddressesCmd>(
            "deriveaddresses",
            UsageFlags::NONE,
            "Derives one or more addresses corresponding to an output descriptor.",
        )
        .must_register_with_description::<SearchRawTransactionsCmd>(
            "searchrawtransactions",
            UsageFlags::NONE,
            "Returns raw data for transactions involving the passed address.",
        )
        .must_register::<BlockConnectedNtfn>("blockconnected", ws_ntfn);
    builder.seal()
}

fn wallet_registry() -> Registry {
    let mut builder = RegistryBuilder::with_config(RegistryConfig {
        partition: "wallet".to_string(),
        ..RegistryConfig::default()
    });
    builder
        .must_register_with_description::<GetBalanceCmd>(
            "getbalance",
            UsageFlags::WALLET_ONLY,
            "Calculates and returns the balance of one or all accounts.",
        )
        .must_register_with_description::<ListUnspentCmd>(
            "listunspent",
            UsageFlags::WALLET_ONLY,
            "Returns a JSON array of objects representing unlocked unspent outputs controlled by wallet keys.",
        )
        .must_register_with_description::<SendManyCmd>(
            "sendmany",
            UsageFlags::WALLET_ONLY,
            "Authors, signs, and sends a transaction that outputs to many payment addresses.",
        )
        .must_register_with_description::<SendToAddressCmd>(
            "sendtoaddress",
            UsageFlags::WALLET_ONLY,
            "Authors, signs, and sends a transaction that outputs some amount to a payment address.",
        )
        .must_register::<WalletPassphraseCmd>("walletpassphrase", UsageFlags::WALLET_ONLY);
    builder.seal()
}

static CHAIN_SERVER: Lazy<Registry> = Lazy::new(chain_server_registry);
static WALLET: Lazy<Registry> = Lazy::new(wallet_registry);

/// Methods served by the chain server
pub fn chain_server() -> &'static Registry {
    &CHAIN_SERVER
}

/// Methods served by the wallet
pub fn wallet() -> &'static Registry {
    &WALLET
}
