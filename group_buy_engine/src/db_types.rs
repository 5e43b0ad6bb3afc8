use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use gb_common::{DividendRate, Money};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid status value: {0}")]
pub struct ConversionError(String);

/// Generates `Display`, `FromStr` and a logging `From<String>` for a fieldless status enum whose database
/// representation is the variant name.
macro_rules! text_enum {
    ($name:ident, $default:ident, [$($variant:ident),+]) => {
        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str(stringify!($variant)),)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok(Self::$variant),)+
                    s => Err(ConversionError(format!("{} is not a valid {}", s, stringify!($name)))),
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                value.parse().unwrap_or_else(|_| {
                    error!(
                        "Invalid {}: {value}. But this conversion cannot fail. Defaulting to {}",
                        stringify!($name),
                        stringify!($default)
                    );
                    Self::$default
                })
            }
        }
    };
}

//--------------------------------------     GroupStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum GroupStatus {
    /// The campaign is open and accepting members.
    Forming,
    /// The member quota has been reached. The group is waiting for its draw.
    Active,
    /// The draw has been performed and dividends have been allocated. Terminal.
    Settled,
}

text_enum!(GroupStatus, Forming, [Forming, Active, Settled]);

impl GroupStatus {
    fn rank(&self) -> u8 {
        match self {
            GroupStatus::Forming => 0,
            GroupStatus::Active => 1,
            GroupStatus::Settled => 2,
        }
    }

    /// Status only ever moves forward. A transition to the same status is not a transition.
    pub fn can_transition_to(&self, next: GroupStatus) -> bool {
        next.rank() > self.rank()
    }
}

//--------------------------------------     GroupBuying     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct GroupBuying {
    pub id: i64,
    pub group_code: String,
    pub product_id: i64,
    pub team_id: i64,
    pub leader_id: i64,
    pub group_size: i64,
    pub current_members: i64,
    pub status: GroupStatus,
    pub started_at: DateTime<Utc>,
    /// Set when the last member joins
    pub ended_at: Option<DateTime<Utc>>,
    /// Set when the group is settled
    pub success_at: Option<DateTime<Utc>>,
}

impl GroupBuying {
    pub fn quorum_reached(&self) -> bool {
        self.current_members >= self.group_size
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGroupBuying {
    pub group_code: String,
    pub product_id: i64,
    pub team_id: i64,
    pub leader_id: i64,
    pub group_size: i64,
}

impl NewGroupBuying {
    pub fn new<S: Into<String>>(group_code: S, product_id: i64, leader_id: i64, group_size: i64) -> Self {
        Self { group_code: group_code.into(), product_id, team_id: 0, leader_id, group_size }
    }

    pub fn with_team(mut self, team_id: i64) -> Self {
        self.team_id = team_id;
        self
    }
}

//--------------------------------------     GroupMember     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: i64,
    pub group_id: i64,
    pub user_id: i64,
    pub order_id: i64,
    pub joined_at: DateTime<Utc>,
}

//--------------------------------------   OrderStatusType   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been placed but not paid for.
    New,
    /// Payment has been confirmed. Paid orders make up the population of a draw.
    Paid,
    /// The order was selected in a draw. The product is delivered.
    Won,
    /// The order took part in a draw but was not selected. It is compensated with a dividend.
    NotWon,
    /// The order has been cancelled by the user or an admin.
    Cancelled,
}

text_enum!(OrderStatusType, New, [New, Paid, Won, NotWon, Cancelled]);

impl OrderStatusType {
    /// Orders that can still be attached to a group buy.
    pub fn is_joinable(&self) -> bool {
        matches!(self, OrderStatusType::New | OrderStatusType::Paid)
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_ref: String,
    pub user_id: i64,
    pub product_id: i64,
    pub actual_amount: Money,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    /// The order reference as assigned by the storefront
    pub order_ref: String,
    pub user_id: i64,
    pub product_id: i64,
    /// The amount actually paid, after discounts
    pub actual_amount: Money,
}

impl NewOrder {
    pub fn new<S: Into<String>>(order_ref: S, user_id: i64, product_id: i64, actual_amount: Money) -> Self {
        Self { order_ref: order_ref.into(), user_id, product_id, actual_amount }
    }
}

//--------------------------------------     Participant     ---------------------------------------------------------
/// A paid order taking part in a draw, reduced to the fields the settlement needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRow, Serialize, Deserialize)]
pub struct Participant {
    pub order_id: i64,
    pub user_id: i64,
    pub actual_amount: Money,
}

impl From<&Order> for Participant {
    fn from(order: &Order) -> Self {
        Self { order_id: order.id, user_id: order.user_id, actual_amount: order.actual_amount }
    }
}

//--------------------------------------     UserAccount     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub balance: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for UserAccount {
    fn default() -> Self {
        Self {
            id: 0,
            username: String::default(),
            balance: Money::default(),
            created_at: DateTime::<Utc>::MIN_UTC,
            updated_at: DateTime::<Utc>::MIN_UTC,
        }
    }
}

//--------------------------------------    ProductConfig    ---------------------------------------------------------
/// The settlement parameters of a product, owned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ProductConfig {
    pub id: i64,
    pub name: String,
    /// How many orders win the product in a draw
    pub winner_count: i64,
    /// The share of the pooled order value that is paid out to non-winners
    pub dividend_rate: DividendRate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub winner_count: i64,
    pub dividend_rate: DividendRate,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, winner_count: i64, dividend_rate: DividendRate) -> Self {
        Self { name: name.into(), winner_count, dividend_rate }
    }
}

//--------------------------------------    LotteryStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum LotteryStatus {
    Undrawn,
    Drawn,
}

text_enum!(LotteryStatus, Undrawn, [Undrawn, Drawn]);

//--------------------------------------     DrawMethod      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum DrawMethod {
    /// Seeded Fisher-Yates shuffle over the participants sorted by order id. The first `winner_count` win.
    FisherYates,
}

text_enum!(DrawMethod, FisherYates, [FisherYates]);

//--------------------------------------    LotteryRecord    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LotteryRecord {
    pub id: i64,
    pub group_id: i64,
    pub product_id: i64,
    pub winner_count: i64,
    pub participant_count: i64,
    pub pool_amount: Money,
    pub dividend_rate: DividendRate,
    pub draw_method: DrawMethod,
    /// The RNG seed used for the draw. Stored as i64; reinterpret as u64 to replay.
    pub draw_seed: i64,
    pub status: LotteryStatus,
    pub drawn_at: DateTime<Utc>,
}

impl LotteryRecord {
    #[allow(clippy::cast_sign_loss)]
    pub fn seed(&self) -> u64 {
        self.draw_seed as u64
    }
}

//--------------------------------------    LotteryWinner    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LotteryWinner {
    pub id: i64,
    pub lottery_id: i64,
    pub user_id: i64,
    pub order_id: i64,
}

//--------------------------------------   DividendStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum DividendStatus {
    /// The dividend has been allocated but not credited to the user's balance.
    Pending,
    /// The dividend has been credited to the user's balance.
    Paid,
}

text_enum!(DividendStatus, Pending, [Pending, Paid]);

//--------------------------------------    DividendType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum DividendType {
    /// A share of the pool paid to a participant that did not win the draw.
    Consolation,
}

text_enum!(DividendType, Consolation, [Consolation]);

//--------------------------------------      Dividend       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Dividend {
    pub id: i64,
    pub lottery_id: i64,
    pub user_id: i64,
    pub order_id: i64,
    pub amount: Money,
    pub dividend_type: DividendType,
    pub status: DividendStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
