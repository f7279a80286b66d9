use alloc::string::String;
use alloy_primitives::{Address, U256};
use alloy_sol_types::sol;
use core::marker::PhantomData;
use stylus_sdk::{prelude::*, stylus_core::log};

use crate::issuance::OwnershipLedger;

// 集合的名称与符号
pub trait Erc721Params {
    const NAME: &'static str;
    const SYMBOL: &'static str;
}

// 只记录归属与余额，不支持转账和授权
sol_storage! {
    pub struct Erc721<T: Erc721Params> {
        // token_id 到拥有者地址的映射
        mapping(uint256 => address) owners;
        // 地址到持有数量的映射
        mapping(address => uint256) balances;
        // 已发行总量，同时是最后一个 token_id
        uint256 total_supply;
        PhantomData<T> phantom;
    }
}

sol! {
    // 铸造时 from 为零地址
    event Transfer(address indexed from, address indexed to, uint256 indexed token_id);

    // token_id 尚未铸造
    error InvalidTokenId(uint256 token_id);
}

#[derive(SolidityError)]
pub enum Erc721Error {
    InvalidTokenId(InvalidTokenId),
}

impl<T: Erc721Params> Erc721<T> {
    // 已发行总量
    pub fn total_minted(&self) -> U256 {
        self.total_supply.get()
    }

    // 由发行逻辑写回计数
    pub fn set_total_minted(&mut self, total: U256) {
        self.total_supply.set(total);
    }
}

impl<T: Erc721Params> OwnershipLedger for Erc721<T> {
    // 从零地址铸造给 owner，并记录转账事件
    fn attribute(&mut self, token_id: U256, owner: Address) {
        self.owners.insert(token_id, owner);
        let mut balance = self.balances.setter(owner);
        let held = balance.get() + U256::from(1u8);
        balance.set(held);
        log(
            self.vm(),
            Transfer {
                from: Address::ZERO,
                to: owner,
                token_id,
            },
        );
    }

    fn balance_of(&self, owner: Address) -> U256 {
        self.balances.get(owner)
    }

    fn owner_of(&self, token_id: U256) -> Option<Address> {
        let owner = self.owners.get(token_id);
        (!owner.is_zero()).then_some(owner)
    }
}

#[public]
impl<T: Erc721Params> Erc721<T> {
    // 获取 NFT 名称
    pub fn name() -> Result<String, Erc721Error> {
        Ok(T::NAME.into())
    }

    // 获取 NFT 符号
    pub fn symbol() -> Result<String, Erc721Error> {
        Ok(T::SYMBOL.into())
    }

    // 获取指定地址的 NFT 余额
    pub fn balance_of(&self, owner: Address) -> Result<U256, Erc721Error> {
        Ok(OwnershipLedger::balance_of(self, owner))
    }

    // 获取指定 token 的拥有者，未铸造则报错
    pub fn owner_of(&self, token_id: U256) -> Result<Address, Erc721Error> {
        OwnershipLedger::owner_of(self, token_id)
            .ok_or(Erc721Error::InvalidTokenId(InvalidTokenId { token_id }))
    }
}
