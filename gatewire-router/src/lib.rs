/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/2/26
******************************************************************************/

//! # Gatewire Router
//!
//! Order lifecycle tracking for the Gatewire venue connector.
//!
//! This crate provides:
//! - **Order model**: Working order records with a validated status lifecycle
//! - **Request tickets**: Typed order/modify/cancel builders
//! - **OrderRouter**: Local validation of requests and matching of venue
//!   responses to working orders
//!
//! The router never performs transport I/O: a request it rejects was
//! never sent, and terminal orders can never transition again.

pub mod order;
pub mod router;

pub use order::{
    CancelTicket, ModifyTicket, Order, OrderStatus, OrderTicket, PendingKind, PendingRequest,
};
pub use router::{OrderRouter, RouterEvent};
