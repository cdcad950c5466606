//! Token definitions and the token registry
//!
//! Decimals differ per token (ckUSDT: 6, ICP: 8, ckETH: 18). Always look
//! them up here before converting amounts.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{CoreError, CoreResult, IcTokenReply, TokenReply, U256};

/// Decimals assumed when a token is unknown
pub const DEFAULT_DECIMALS: u8 = 8;

/// Token information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub canister_id: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub fee: U256,
    pub chain: String,
    pub icrc1: bool,
    pub icrc2: bool,
}

impl Token {
    pub fn new(canister_id: &str, symbol: &str, name: &str, decimals: u8) -> Self {
        Self {
            canister_id: canister_id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            decimals,
            fee: U256::ZERO,
            chain: "IC".to_string(),
            icrc1: true,
            icrc2: false,
        }
    }

    pub fn with_fee(mut self, fee: U256) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_icrc2(mut self, icrc2: bool) -> Self {
        self.icrc2 = icrc2;
        self
    }

    /// Matches either the canister id or the symbol
    pub fn matches(&self, symbol_or_id: &str) -> bool {
        self.canister_id == symbol_or_id || self.symbol == symbol_or_id
    }
}

impl From<IcTokenReply> for Token {
    fn from(reply: IcTokenReply) -> Self {
        Self {
            canister_id: reply.canister_id,
            symbol: reply.symbol,
            name: reply.name,
            decimals: reply.decimals,
            fee: reply.fee,
            chain: reply.chain,
            icrc1: reply.icrc1,
            icrc2: reply.icrc2,
        }
    }
}

/// Keep IC tokens, drop LP tokens
pub fn parse_tokens(replies: Vec<TokenReply>) -> Vec<Token> {
    replies
        .into_iter()
        .filter_map(|reply| match reply {
            TokenReply::IC(ic) => Some(Token::from(ic)),
            TokenReply::LP(_) => None,
        })
        .collect()
}

/// Known tokens, replaceable as fresh listings arrive
#[derive(Debug, Default)]
pub struct TokenRegistry {
    tokens: RwLock<Vec<Token>>,
}

impl TokenRegistry {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: RwLock::new(tokens),
        }
    }

    pub fn replace(&self, tokens: Vec<Token>) {
        *self.tokens.write() = tokens;
    }

    pub fn all(&self) -> Vec<Token> {
        self.tokens.read().clone()
    }

    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }

    /// Find by canister id first, then by symbol
    pub fn find(&self, symbol_or_id: &str) -> Option<Token> {
        let tokens = self.tokens.read();
        tokens
            .iter()
            .find(|t| t.canister_id == symbol_or_id)
            .or_else(|| tokens.iter().find(|t| t.symbol == symbol_or_id))
            .cloned()
    }

    pub fn require(&self, symbol_or_id: &str) -> CoreResult<Token> {
        self.find(symbol_or_id)
            .ok_or_else(|| CoreError::TokenNotFound(symbol_or_id.to_string()))
    }

    /// Decimals for a token, falling back to `DEFAULT_DECIMALS`
    pub fn decimals_of(&self, symbol_or_id: &str) -> u8 {
        match self.find(symbol_or_id) {
            Some(token) => token.decimals,
            None => {
                warn!("Unknown token {}, assuming {} decimals", symbol_or_id, DEFAULT_DECIMALS);
                DEFAULT_DECIMALS
            }
        }
    }
}
