/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! Core types for venue connector operations.
//!
//! This module provides fundamental types used throughout Gatewire:
//! - [`SeqNum`]: Session sequence number
//! - [`Timestamp`]: UTC timestamp with nanosecond precision
//! - [`ClientOrderId`]: Bounded client order identifier
//! - [`Side`], [`OrdType`], [`TimeInForce`]: Order attribute enumerations
//! - [`ExecType`], [`RejectResponseTo`]: Venue response classification codes

use arrayvec::ArrayString;
use chrono::{DateTime, Utc};
use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length for client order identifiers in bytes.
pub const CLIENT_ORDER_ID_MAX_LEN: usize = 24;

/// Session message sequence number.
///
/// Sequence numbers are unsigned 64-bit integers that identify messages
/// within a session. They start at 1 and increment for each message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct SeqNum(u64);

impl SeqNum {
    /// Creates a new sequence number.
    ///
    /// # Arguments
    /// * `value` - The sequence number value (should be >= 1 for valid messages)
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw sequence number value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the next sequence number.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Checks if this sequence number is valid (>= 1).
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 >= 1
    }
}

impl Default for SeqNum {
    fn default() -> Self {
        Self(1)
    }
}

impl From<u64> for SeqNum {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<SeqNum> for u64 {
    fn from(seq: SeqNum) -> Self {
        seq.0
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// UTC timestamp with nanosecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Nanoseconds since Unix epoch (1970-01-01 00:00:00 UTC).
    nanos_since_epoch: u64,
}

impl Timestamp {
    /// Creates a timestamp from nanoseconds since Unix epoch.
    ///
    /// # Arguments
    /// * `nanos` - Nanoseconds since 1970-01-01 00:00:00 UTC
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self {
            nanos_since_epoch: nanos,
        }
    }

    /// Creates a timestamp from milliseconds since Unix epoch.
    ///
    /// # Arguments
    /// * `millis` - Milliseconds since 1970-01-01 00:00:00 UTC
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self {
            nanos_since_epoch: millis * 1_000_000,
        }
    }

    /// Returns the current UTC timestamp.
    #[inline]
    #[must_use]
    pub fn now() -> Self {
        let dt = Utc::now();
        Self {
            nanos_since_epoch: dt.timestamp_nanos_opt().unwrap_or(0) as u64,
        }
    }

    /// Returns nanoseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.nanos_since_epoch
    }

    /// Returns milliseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.nanos_since_epoch / 1_000_000
    }

    /// Converts to a chrono `DateTime<Utc>`.
    #[must_use]
    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.nanos_since_epoch as i64)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            nanos_since_epoch: dt.timestamp_nanos_opt().unwrap_or(0) as u64,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_datetime().format("%Y%m%d-%H:%M:%S%.3f"))
    }
}

/// Client order identifier.
///
/// Unique per session; referenced by modify and cancel requests as the
/// original order id. Maximum length is 24 bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct ClientOrderId(ArrayString<CLIENT_ORDER_ID_MAX_LEN>);

impl ClientOrderId {
    /// Creates a new client order id from a string slice.
    ///
    /// # Arguments
    /// * `s` - The identifier string
    ///
    /// # Returns
    /// `Some(ClientOrderId)` if the string fits within the maximum length,
    /// `None` otherwise.
    #[must_use]
    pub fn new(s: &str) -> Option<Self> {
        ArrayString::from(s).ok().map(Self)
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the length of the id in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the id is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for ClientOrderId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClientOrderId {
    type Err = arrayvec::CapacityError<()>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArrayString::try_from(s)
            .map(Self)
            .map_err(|_| arrayvec::CapacityError::new(()))
    }
}

/// Order side enumeration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromPrimitive, ToPrimitive,
)]
#[repr(u8)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order.
    Buy = b'1',
    /// Sell order.
    Sell = b'2',
    /// Buy minus (sell short exempt).
    BuyMinus = b'3',
    /// Sell plus (buy to cover).
    SellPlus = b'4',
    /// Sell short.
    SellShort = b'5',
    /// Sell short exempt.
    SellShortExempt = b'6',
    /// Undisclosed.
    Undisclosed = b'7',
    /// Cross (both sides).
    Cross = b'8',
    /// Cross short.
    CrossShort = b'9',
    /// Cross short exempt.
    CrossShortExempt = b'A',
    /// As defined (for multileg).
    AsDefined = b'B',
    /// Opposite (for multileg).
    Opposite = b'C',
    /// Subscribe.
    Subscribe = b'D',
    /// Redeem.
    Redeem = b'E',
    /// Lend (for securities lending).
    Lend = b'F',
    /// Borrow (for securities lending).
    Borrow = b'G',
    /// Sell undisclosed.
    SellUndisclosed = b'H',
}

impl Side {
    /// Creates a Side from a single character.
    ///
    /// # Arguments
    /// * `c` - The character representing the side
    ///
    /// # Returns
    /// `Some(Side)` if the character is valid, `None` otherwise.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '1' => Some(Self::Buy),
            '2' => Some(Self::Sell),
            '3' => Some(Self::BuyMinus),
            '4' => Some(Self::SellPlus),
            '5' => Some(Self::SellShort),
            '6' => Some(Self::SellShortExempt),
            '7' => Some(Self::Undisclosed),
            '8' => Some(Self::Cross),
            '9' => Some(Self::CrossShort),
            'A' => Some(Self::CrossShortExempt),
            'B' => Some(Self::AsDefined),
            'C' => Some(Self::Opposite),
            'D' => Some(Self::Subscribe),
            'E' => Some(Self::Redeem),
            'F' => Some(Self::Lend),
            'G' => Some(Self::Borrow),
            'H' => Some(Self::SellUndisclosed),
            _ => None,
        }
    }

    /// Returns the character representation of this side.
    #[must_use]
    pub const fn as_char(self) -> char {
        self as u8 as char
    }

    /// Returns true if this is a buy-side order.
    #[must_use]
    pub const fn is_buy(self) -> bool {
        matches!(self, Self::Buy | Self::BuyMinus)
    }

    /// Returns true if this is a sell-side order.
    #[must_use]
    pub const fn is_sell(self) -> bool {
        matches!(
            self,
            Self::Sell
                | Self::SellPlus
                | Self::SellShort
                | Self::SellShortExempt
                | Self::SellUndisclosed
        )
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl TryFrom<u8> for Side {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_char(value as char).ok_or(())
    }
}

/// Order type enumeration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromPrimitive, ToPrimitive,
)]
#[repr(u8)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrdType {
    /// Market order.
    Market = b'1',
    /// Limit order.
    Limit = b'2',
    /// Stop order.
    Stop = b'3',
    /// Stop limit order.
    StopLimit = b'4',
    /// Market on close.
    MarketOnClose = b'5',
    /// With or without.
    WithOrWithout = b'6',
    /// Limit or better.
    LimitOrBetter = b'7',
    /// Limit with or without.
    LimitWithOrWithout = b'8',
    /// On basis.
    OnBasis = b'9',
    /// On close.
    OnClose = b'A',
    /// Limit on close.
    LimitOnClose = b'B',
    /// Forex.
    Forex = b'C',
    /// Previously quoted.
    PreviouslyQuoted = b'D',
    /// Previously indicated.
    PreviouslyIndicated = b'E',
    /// Pegged.
    Pegged = b'P',
}

impl OrdType {
    /// Creates an OrdType from a single character.
    ///
    /// # Arguments
    /// * `c` - The character representing the order type
    ///
    /// # Returns
    /// `Some(OrdType)` if the character is valid, `None` otherwise.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '1' => Some(Self::Market),
            '2' => Some(Self::Limit),
            '3' => Some(Self::Stop),
            '4' => Some(Self::StopLimit),
            '5' => Some(Self::MarketOnClose),
            '6' => Some(Self::WithOrWithout),
            '7' => Some(Self::LimitOrBetter),
            '8' => Some(Self::LimitWithOrWithout),
            '9' => Some(Self::OnBasis),
            'A' => Some(Self::OnClose),
            'B' => Some(Self::LimitOnClose),
            'C' => Some(Self::Forex),
            'D' => Some(Self::PreviouslyQuoted),
            'E' => Some(Self::PreviouslyIndicated),
            'P' => Some(Self::Pegged),
            _ => None,
        }
    }

    /// Returns the character representation of this order type.
    #[must_use]
    pub const fn as_char(self) -> char {
        self as u8 as char
    }

    /// Returns true if this order type requires a limit price.
    #[must_use]
    pub const fn requires_price(self) -> bool {
        matches!(
            self,
            Self::Limit | Self::StopLimit | Self::LimitOrBetter | Self::LimitOnClose
        )
    }
}

impl fmt::Display for OrdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl TryFrom<u8> for OrdType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_char(value as char).ok_or(())
    }
}

/// Time-in-force enumeration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromPrimitive, ToPrimitive,
)]
#[repr(u8)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    /// Valid for the trading day.
    Day = b'0',
    /// Good till cancel.
    Gtc = b'1',
    /// At the opening.
    Opg = b'2',
    /// Immediate or cancel.
    Ioc = b'3',
    /// Fill or kill.
    Fok = b'4',
    /// Good till crossing.
    Gtx = b'5',
    /// Good till date.
    Gtd = b'6',
    /// At the close.
    Atc = b'7',
    /// Good till time.
    Gtt = b'8',
    /// Close price crossing.
    Cpx = b'9',
    /// Good for auction.
    Gfa = b'A',
    /// Good for crossing.
    Gfx = b'B',
    /// Good for settlement.
    Gfs = b'C',
}

impl TimeInForce {
    /// Creates a TimeInForce from a single character.
    ///
    /// # Arguments
    /// * `c` - The character representing the time in force
    ///
    /// # Returns
    /// `Some(TimeInForce)` if the character is valid, `None` otherwise.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Self::Day),
            '1' => Some(Self::Gtc),
            '2' => Some(Self::Opg),
            '3' => Some(Self::Ioc),
            '4' => Some(Self::Fok),
            '5' => Some(Self::Gtx),
            '6' => Some(Self::Gtd),
            '7' => Some(Self::Atc),
            '8' => Some(Self::Gtt),
            '9' => Some(Self::Cpx),
            'A' => Some(Self::Gfa),
            'B' => Some(Self::Gfx),
            'C' => Some(Self::Gfs),
            _ => None,
        }
    }

    /// Returns the character representation of this time in force.
    #[must_use]
    pub const fn as_char(self) -> char {
        self as u8 as char
    }
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl TryFrom<u8> for TimeInForce {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_char(value as char).ok_or(())
    }
}

/// Execution report classification code.
///
/// Determines which message callback an execution report is routed to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromPrimitive, ToPrimitive,
)]
#[repr(u8)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecType {
    /// Order accepted by the venue.
    New = b'0',
    /// Order partially filled.
    PartialFill = b'1',
    /// Order fully filled.
    Fill = b'2',
    /// Order done for the day (expired, IOC remainder).
    DoneForDay = b'3',
    /// Order cancelled.
    Cancelled = b'4',
    /// Modify accepted, order replaced.
    Replaced = b'5',
    /// Order rejected by the venue.
    Rejected = b'8',
}

impl ExecType {
    /// Creates an ExecType from a single character.
    ///
    /// # Arguments
    /// * `c` - The character representing the execution type
    ///
    /// # Returns
    /// `Some(ExecType)` if the character is valid, `None` otherwise.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Self::New),
            '1' => Some(Self::PartialFill),
            '2' => Some(Self::Fill),
            '3' => Some(Self::DoneForDay),
            '4' => Some(Self::Cancelled),
            '5' => Some(Self::Replaced),
            '8' => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns the character representation of this execution type.
    #[must_use]
    pub const fn as_char(self) -> char {
        self as u8 as char
    }

    /// Returns true if this execution type reports a trade.
    #[must_use]
    pub const fn is_fill(self) -> bool {
        matches!(self, Self::PartialFill | Self::Fill)
    }
}

impl fmt::Display for ExecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl TryFrom<u8> for ExecType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_char(value as char).ok_or(())
    }
}

/// Identifies which request a cancel reject responds to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromPrimitive, ToPrimitive,
)]
#[repr(u8)]
#[serde(rename_all = "UPPERCASE")]
pub enum RejectResponseTo {
    /// Reject of a cancel request.
    Cancel = b'1',
    /// Reject of a modify request.
    Modify = b'2',
}

impl RejectResponseTo {
    /// Creates a RejectResponseTo from a single character.
    ///
    /// # Arguments
    /// * `c` - The character representing the response target
    ///
    /// # Returns
    /// `Some(RejectResponseTo)` if the character is valid, `None` otherwise.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '1' => Some(Self::Cancel),
            '2' => Some(Self::Modify),
            _ => None,
        }
    }

    /// Returns the character representation.
    #[must_use]
    pub const fn as_char(self) -> char {
        self as u8 as char
    }
}

impl fmt::Display for RejectResponseTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl TryFrom<u8> for RejectResponseTo {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_char(value as char).ok_or(())
    }
}
