use alloc::{string::String, vec::Vec};
use alloy_primitives::{uint, Address, U256};

// 百分比基数
pub const PERCENT_BASE: U256 = uint!(100_U256);
// 预售阶段允许的最大折扣
pub const MAX_PRESALE_DISCOUNT: U256 = uint!(50_U256);

// 销售阶段：预售 -> 公售，单向切换
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalePhase {
    PreSale,
    PublicSale,
}

impl SalePhase {
    // 当前阶段允许的折扣上限（闭区间）
    pub fn max_discount(self) -> U256 {
        match self {
            SalePhase::PreSale => MAX_PRESALE_DISCOUNT,
            SalePhase::PublicSale => U256::ZERO,
        }
    }

    pub fn is_pre_sale(self) -> bool {
        matches!(self, SalePhase::PreSale)
    }
}

fn discount_rejection(phase: &SalePhase) -> &'static str {
    match phase {
        SalePhase::PreSale => "discount out of range",
        SalePhase::PublicSale => "discount not allowed outside presale",
    }
}

// 铸造被拒绝的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IssuanceError {
    #[error("amount required")]
    InvalidAmount,
    #[error("max amount per mint")]
    BatchTooLarge { requested: U256, max: U256 },
    #[error("max supply exceeded")]
    SupplyExceeded {
        minted: U256,
        requested: U256,
        max: U256,
    },
    #[error("{}", discount_rejection(.phase))]
    DiscountOutOfRange { discount: U256, phase: SalePhase },
    #[error("insufficient payment")]
    InsufficientPayment { required: U256, provided: U256 },
    #[error("mint to the zero address")]
    InvalidRecipient,
    #[error("nonexistent token")]
    NonexistentToken { token_id: U256 },
    #[error("presale already ended")]
    PreSaleEnded,
    #[error("already revealed")]
    AlreadyRevealed,
    #[error("retained balance overflow")]
    RetainedOverflow,
}

// 配置错误，只在构建状态时出现
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid sale setup")]
    InvalidSaleSetup,
    #[error("minted {minted} exceeds max supply {max}")]
    SupplyOverrun { minted: U256, max: U256 },
}

// 外部所有权账本：只负责记录 token 归属
pub trait OwnershipLedger {
    // 将一个全新的 token_id 记到 owner 名下
    fn attribute(&mut self, token_id: U256, owner: Address);
    fn balance_of(&self, owner: Address) -> U256;
    // 未铸造的 token 返回 None
    fn owner_of(&self, token_id: U256) -> Option<Address>;
}

// 编译期销售参数
pub trait SaleParams {
    const MAX_SUPPLY: U256;
    const MAX_PER_MINT: U256;
    // 每个 token 的价格，单位 wei
    const SALE_COST: U256;
    const BASE_URI: &'static str;
    const HIDDEN_URI: &'static str;

    fn sale_config() -> Result<SaleConfig, ConfigError> {
        SaleConfig::new(Self::MAX_SUPPLY, Self::MAX_PER_MINT, Self::SALE_COST)
    }

    fn token_metadata() -> TokenMetadata {
        TokenMetadata {
            base_uri: Self::BASE_URI.into(),
            hidden_uri: Self::HIDDEN_URI.into(),
        }
    }
}

// 不可变的销售上限与价格
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleConfig {
    max_supply: U256,
    max_per_mint: U256,
    sale_cost: U256,
}

impl SaleConfig {
    pub fn new(max_supply: U256, max_per_mint: U256, sale_cost: U256) -> Result<Self, ConfigError> {
        if max_supply.is_zero() || max_per_mint.is_zero() || max_per_mint > max_supply {
            return Err(ConfigError::InvalidSaleSetup);
        }
        // 保证 admit 中的价格计算不会溢出
        sale_cost
            .checked_mul(max_per_mint)
            .and_then(|v| v.checked_mul(PERCENT_BASE))
            .ok_or(ConfigError::InvalidSaleSetup)?;
        Ok(Self {
            max_supply,
            max_per_mint,
            sale_cost,
        })
    }

    pub fn max_supply(&self) -> U256 {
        self.max_supply
    }

    pub fn max_per_mint(&self) -> U256 {
        self.max_per_mint
    }

    pub fn sale_cost(&self) -> U256 {
        self.sale_cost
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub base_uri: String,
    pub hidden_uri: String,
}

// 持久化的发行进度，用于恢复状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub total_minted: U256,
    pub retained: U256,
    pub phase: SalePhase,
    pub revealed: bool,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            total_minted: U256::ZERO,
            retained: U256::ZERO,
            phase: SalePhase::PreSale,
            revealed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintRequest {
    pub recipient: Address,
    pub amount: U256,
    pub discount: U256,
    // 随调用附带的 wei
    pub payment: U256,
}

// 通过校验的铸造请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub recipient: Address,
    pub first_token_id: U256,
    pub amount: U256,
    pub required: U256,
    pub payment: U256,
}

impl Admission {
    // 本次铸造的连续 token_id
    pub fn token_ids(&self) -> Vec<U256> {
        let mut ids = Vec::new();
        let mut id = self.first_token_id;
        let end = self.first_token_id + self.amount;
        while id < end {
            ids.push(id);
            id += U256::from(1u8);
        }
        ids
    }
}

// 应付金额 = 单价 * 数量 * (100 - 折扣) / 100，向下取整
pub fn required_payment(sale_cost: U256, amount: U256, discount: U256) -> U256 {
    sale_cost * amount * (PERCENT_BASE - discount) / PERCENT_BASE
}

// 单个集合的发行计数、销售阶段与 URI
// 所有修改都经过 &mut self；多方共享时需整体加锁，供应检查与计数递增才是一步
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuanceState {
    config: SaleConfig,
    metadata: TokenMetadata,
    total_minted: U256,
    retained: U256,
    phase: SalePhase,
    revealed: bool,
}

impl IssuanceState {
    // 部署时的初始状态：预售、未揭示、计数为零
    pub fn new(config: SaleConfig, metadata: TokenMetadata) -> Self {
        let progress = Progress::default();
        Self {
            config,
            metadata,
            total_minted: progress.total_minted,
            retained: progress.retained,
            phase: progress.phase,
            revealed: progress.revealed,
        }
    }

    // 从持久化的进度恢复
    pub fn resume(
        config: SaleConfig,
        metadata: TokenMetadata,
        progress: Progress,
    ) -> Result<Self, ConfigError> {
        if progress.total_minted > config.max_supply() {
            return Err(ConfigError::SupplyOverrun {
                minted: progress.total_minted,
                max: config.max_supply(),
            });
        }
        Ok(Self {
            config,
            metadata,
            total_minted: progress.total_minted,
            retained: progress.retained,
            phase: progress.phase,
            revealed: progress.revealed,
        })
    }

    pub fn progress(&self) -> Progress {
        Progress {
            total_minted: self.total_minted,
            retained: self.retained,
            phase: self.phase,
            revealed: self.revealed,
        }
    }

    // 按顺序校验，不修改任何状态
    pub fn admit(&self, request: &MintRequest) -> Result<Admission, IssuanceError> {
        let amount = request.amount;
        if amount.is_zero() {
            return Err(IssuanceError::InvalidAmount);
        }
        if amount > self.config.max_per_mint() {
            return Err(IssuanceError::BatchTooLarge {
                requested: amount,
                max: self.config.max_per_mint(),
            });
        }
        // 检查整批数量，而不只是当前计数
        if amount > self.config.max_supply() - self.total_minted {
            return Err(IssuanceError::SupplyExceeded {
                minted: self.total_minted,
                requested: amount,
                max: self.config.max_supply(),
            });
        }
        if request.discount > self.phase.max_discount() {
            return Err(IssuanceError::DiscountOutOfRange {
                discount: request.discount,
                phase: self.phase,
            });
        }
        let required = required_payment(self.config.sale_cost(), amount, request.discount);
        if request.payment < required {
            return Err(IssuanceError::InsufficientPayment {
                required,
                provided: request.payment,
            });
        }
        if request.recipient.is_zero() {
            return Err(IssuanceError::InvalidRecipient);
        }
        self.retained
            .checked_add(request.payment)
            .ok_or(IssuanceError::RetainedOverflow)?;
        Ok(Admission {
            recipient: request.recipient,
            first_token_id: self.total_minted + U256::from(1u8),
            amount,
            required,
            payment: request.payment,
        })
    }

    // 校验通过后一次性写入；多付的部分不退还
    pub fn mint<L: OwnershipLedger>(
        &mut self,
        ledger: &mut L,
        request: &MintRequest,
    ) -> Result<Admission, IssuanceError> {
        let admission = self.admit(request)?;
        for id in admission.token_ids() {
            ledger.attribute(id, admission.recipient);
        }
        self.total_minted += admission.amount;
        // admit 已检查不会溢出
        self.retained += admission.payment;
        Ok(admission)
    }

    // 未揭示前所有 token 返回同一个隐藏 URI
    pub fn token_uri(&self, token_id: U256) -> Result<String, IssuanceError> {
        if token_id.is_zero() || token_id > self.total_minted {
            return Err(IssuanceError::NonexistentToken { token_id });
        }
        if !self.revealed {
            return Ok(self.metadata.hidden_uri.clone());
        }
        Ok(format!("{}{}", self.metadata.base_uri, token_id))
    }

    // 预售 -> 公售，不可回退
    pub fn end_pre_sale(&mut self) -> Result<(), IssuanceError> {
        if !self.phase.is_pre_sale() {
            return Err(IssuanceError::PreSaleEnded);
        }
        self.phase = SalePhase::PublicSale;
        Ok(())
    }

    pub fn reveal(&mut self) -> Result<(), IssuanceError> {
        if self.revealed {
            return Err(IssuanceError::AlreadyRevealed);
        }
        self.revealed = true;
        Ok(())
    }

    // 只替换基础 URI，隐藏 URI 不变
    pub fn set_base_uri(&mut self, uri: String) {
        self.metadata.base_uri = uri;
    }

    pub fn sale_cost(&self) -> U256 {
        self.config.sale_cost()
    }

    pub fn is_pre_sale(&self) -> bool {
        self.phase.is_pre_sale()
    }

    pub fn phase(&self) -> SalePhase {
        self.phase
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn base_token_uri(&self) -> &str {
        &self.metadata.base_uri
    }

    pub fn total_minted(&self) -> U256 {
        self.total_minted
    }

    pub fn retained_balance(&self) -> U256 {
        self.retained
    }

    pub fn max_supply(&self) -> U256 {
        self.config.max_supply()
    }
}
