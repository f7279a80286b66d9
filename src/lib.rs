// 如果未启用 export-abi 特性，仅作为 WASM 运行
#![cfg_attr(not(any(feature = "export-abi", test)), no_main)]
extern crate alloc;

mod erc721;
pub mod issuance;

use crate::erc721::{Erc721, Erc721Params};
use crate::issuance::{
    ConfigError, IssuanceError, IssuanceState, MintRequest, Progress, SaleParams, SalePhase,
    TokenMetadata,
};
use alloc::{string::String, vec::Vec};
use alloy_primitives::{uint, Address, U256};
use alloy_sol_types::sol;
use stylus_sdk::{prelude::*, stylus_core::log};

#[cfg(target_arch = "wasm32")]
#[global_allocator]
static ALLOC: mini_alloc::MiniAlloc = mini_alloc::MiniAlloc::INIT;

pub struct GangNftParams;

impl Erc721Params for GangNftParams {
    const NAME: &'static str = "GangNFT";
    const SYMBOL: &'static str = "GANG";
}

impl SaleParams for GangNftParams {
    const MAX_SUPPLY: U256 = uint!(25_U256);
    const MAX_PER_MINT: U256 = uint!(3_U256);
    // 0.02 ether
    const SALE_COST: U256 = uint!(20000000000000000_U256);
    const BASE_URI: &'static str =
        "https://ipfs.io/ipfs/QmeUa6rJY5VCH6pcmyyaipNtbisW2egv11h26EJyUEsW8X/";
    const HIDDEN_URI: &'static str =
        "https://ipfs.io/ipfs/QmeUa6rJY5VCH6pcmyyaipNtbisW2egv11h26EJyUEsW8X/hidden.json";
}

// 合约存储：发行计数保存在 erc721.total_supply
sol_storage! {
    #[entrypoint]
    pub struct GangNft {
        #[borrow]
        Erc721<GangNftParams> erc721;
        address owner;
        // false 表示仍在预售
        bool public_sale;
        bool revealed;
        string base_uri;
        string hidden_uri;
        // 累计收到的 wei，多付不退
        uint256 retained;
    }
}

sol! {
    event Minted(address indexed recipient, uint256 indexed first_token_id, uint256 amount, uint256 required, uint256 paid);
    event PreSaleEnded();
    event Revealed(string base_uri);

    error AmountRequired();
    error MaxAmountPerMint(uint256 requested, uint256 max);
    error MaxSupplyExceeded(uint256 minted, uint256 requested, uint256 max);
    error DiscountOutOfRange(uint256 discount, uint256 max);
    error DiscountNotAllowed(uint256 discount);
    error InsufficientPayment(uint256 required, uint256 provided);
    error MintToZeroAddress();
    error NonexistentToken(uint256 token_id);
    error PreSaleAlreadyEnded();
    error AlreadyRevealed();
    error InvalidSaleSetup();
    error NotContractOwner(address caller);
    error AlreadyInitialized();
    error NotInitialized();
    error RetainedOverflow();
}

#[derive(SolidityError)]
pub enum GangNftError {
    AmountRequired(AmountRequired),
    MaxAmountPerMint(MaxAmountPerMint),
    MaxSupplyExceeded(MaxSupplyExceeded),
    DiscountOutOfRange(DiscountOutOfRange),
    DiscountNotAllowed(DiscountNotAllowed),
    InsufficientPayment(InsufficientPayment),
    MintToZeroAddress(MintToZeroAddress),
    NonexistentToken(NonexistentToken),
    PreSaleAlreadyEnded(PreSaleAlreadyEnded),
    AlreadyRevealed(AlreadyRevealed),
    InvalidSaleSetup(InvalidSaleSetup),
    NotContractOwner(NotContractOwner),
    AlreadyInitialized(AlreadyInitialized),
    NotInitialized(NotInitialized),
    RetainedOverflow(RetainedOverflow),
}

impl From<IssuanceError> for GangNftError {
    fn from(err: IssuanceError) -> Self {
        match err {
            IssuanceError::InvalidAmount => Self::AmountRequired(AmountRequired {}),
            IssuanceError::BatchTooLarge { requested, max } => {
                Self::MaxAmountPerMint(MaxAmountPerMint { requested, max })
            }
            IssuanceError::SupplyExceeded {
                minted,
                requested,
                max,
            } => Self::MaxSupplyExceeded(MaxSupplyExceeded {
                minted,
                requested,
                max,
            }),
            IssuanceError::DiscountOutOfRange { discount, phase } => match phase {
                SalePhase::PreSale => Self::DiscountOutOfRange(DiscountOutOfRange {
                    discount,
                    max: phase.max_discount(),
                }),
                SalePhase::PublicSale => Self::DiscountNotAllowed(DiscountNotAllowed { discount }),
            },
            IssuanceError::InsufficientPayment { required, provided } => {
                Self::InsufficientPayment(InsufficientPayment { required, provided })
            }
            IssuanceError::InvalidRecipient => Self::MintToZeroAddress(MintToZeroAddress {}),
            IssuanceError::NonexistentToken { token_id } => {
                Self::NonexistentToken(NonexistentToken { token_id })
            }
            IssuanceError::PreSaleEnded => Self::PreSaleAlreadyEnded(PreSaleAlreadyEnded {}),
            IssuanceError::AlreadyRevealed => Self::AlreadyRevealed(AlreadyRevealed {}),
            IssuanceError::RetainedOverflow => Self::RetainedOverflow(RetainedOverflow {}),
        }
    }
}

impl From<ConfigError> for GangNftError {
    fn from(_err: ConfigError) -> Self {
        Self::InvalidSaleSetup(InvalidSaleSetup {})
    }
}

impl GangNft {
    // 从存储中恢复发行状态；未初始化时 URI 尚未写入，拒绝一切读写
    fn issuance(&self) -> Result<IssuanceState, GangNftError> {
        if self.owner.get().is_zero() {
            return Err(GangNftError::NotInitialized(NotInitialized {}));
        }
        let metadata = TokenMetadata {
            base_uri: self.base_uri.get_string(),
            hidden_uri: self.hidden_uri.get_string(),
        };
        let phase = if self.public_sale.get() {
            SalePhase::PublicSale
        } else {
            SalePhase::PreSale
        };
        let progress = Progress {
            total_minted: self.erc721.total_minted(),
            retained: self.retained.get(),
            phase,
            revealed: self.revealed.get(),
        };
        Ok(IssuanceState::resume(
            GangNftParams::sale_config()?,
            metadata,
            progress,
        )?)
    }

    // 写回计数、余额与阶段；URI 只在管理操作中写入
    fn persist(&mut self, state: &IssuanceState) {
        let progress = state.progress();
        self.erc721.set_total_minted(progress.total_minted);
        self.retained.set(progress.retained);
        self.public_sale.set(!progress.phase.is_pre_sale());
        self.revealed.set(progress.revealed);
    }

    // 仅合约管理者可调用
    fn only_owner(&self) -> Result<(), GangNftError> {
        let caller = self.vm().msg_sender();
        if caller != self.owner.get() {
            return Err(GangNftError::NotContractOwner(NotContractOwner { caller }));
        }
        Ok(())
    }
}

#[public]
#[inherit(Erc721<GangNftParams>)]
impl GangNft {
    // 设置合约管理者并写入初始 URI
    pub fn initialize(&mut self) -> Result<(), GangNftError> {
        if !self.owner.get().is_zero() {
            return Err(GangNftError::AlreadyInitialized(AlreadyInitialized {}));
        }
        let metadata = GangNftParams::token_metadata();
        let owner = self.vm().msg_sender();
        self.owner.set(owner);
        self.base_uri.set_str(&metadata.base_uri);
        self.hidden_uri.set_str(&metadata.hidden_uri);
        Ok(())
    }

    // 为 to 铸造 amount 个 token，附带的 wei 作为付款
    #[payable]
    pub fn mint(
        &mut self,
        to: Address,
        amount: U256,
        discount: U256,
    ) -> Result<Vec<U256>, GangNftError> {
        let mut state = self.issuance()?;
        let request = MintRequest {
            recipient: to,
            amount,
            discount,
            payment: self.vm().msg_value(),
        };
        let admission = state.mint(&mut self.erc721, &request)?;
        self.persist(&state);
        log(
            self.vm(),
            Minted {
                recipient: to,
                first_token_id: admission.first_token_id,
                amount,
                required: admission.required,
                paid: admission.payment,
            },
        );
        Ok(admission.token_ids())
    }

    // 每个 token 的原价，单位 wei
    pub fn sale_cost(&self) -> Result<U256, GangNftError> {
        Ok(GangNftParams::sale_config()?.sale_cost())
    }

    // 是否仍处于预售阶段
    pub fn is_pre_sale(&self) -> Result<bool, GangNftError> {
        Ok(!self.public_sale.get())
    }

    // 揭示后使用的基础 URI
    #[selector(name = "baseTokenURI")]
    pub fn base_token_uri(&self) -> Result<String, GangNftError> {
        Ok(self.base_uri.get_string())
    }

    // 获取指定 token 的 URI，未揭示时返回隐藏 URI
    #[selector(name = "tokenURI")]
    pub fn token_uri(&self, token_id: U256) -> Result<String, GangNftError> {
        Ok(self.issuance()?.token_uri(token_id)?)
    }

    // 已铸造总量
    pub fn total_supply(&self) -> Result<U256, GangNftError> {
        Ok(self.erc721.total_minted())
    }

    // 供应上限
    pub fn max_supply(&self) -> Result<U256, GangNftError> {
        Ok(GangNftParams::sale_config()?.max_supply())
    }

    // 单次铸造上限
    pub fn max_per_mint(&self) -> Result<U256, GangNftError> {
        Ok(GangNftParams::sale_config()?.max_per_mint())
    }

    pub fn is_revealed(&self) -> Result<bool, GangNftError> {
        Ok(self.revealed.get())
    }

    // 合约累计收到的付款
    pub fn retained_balance(&self) -> Result<U256, GangNftError> {
        Ok(self.retained.get())
    }

    // 更新基础 URI，仅管理者
    #[selector(name = "setBaseURI")]
    pub fn set_base_uri(&mut self, uri: String) -> Result<(), GangNftError> {
        self.only_owner()?;
        let mut state = self.issuance()?;
        state.set_base_uri(uri);
        self.base_uri.set_str(state.base_token_uri());
        Ok(())
    }

    // 预售结束后不可恢复
    pub fn end_pre_sale(&mut self) -> Result<(), GangNftError> {
        self.only_owner()?;
        let mut state = self.issuance()?;
        state.end_pre_sale()?;
        self.persist(&state);
        log(self.vm(), PreSaleEnded {});
        Ok(())
    }

    // 切换到真实 URI，不可撤销
    pub fn reveal(&mut self) -> Result<(), GangNftError> {
        self.only_owner()?;
        let mut state = self.issuance()?;
        state.reveal()?;
        self.persist(&state);
        log(
            self.vm(),
            Revealed {
                base_uri: state.base_token_uri().into(),
            },
        );
        Ok(())
    }
}
