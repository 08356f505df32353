//! Document schemas for FRA-Connect
//!
//! Defines the stored shapes for users, villages and forest rights claims.

mod claim;
pub mod geometry;
pub mod timestamp;
mod user;
mod village;

pub use claim::{
    AiRecommendation, ClaimDoc, ClaimStatus, ClaimType, DocumentRef, CLAIM_COLLECTION,
};
pub use geometry::{Geometry, Located, Position};
pub use user::{UserDoc, UserResponse, USER_COLLECTION};
pub use village::{VillageDoc, VILLAGE_COLLECTION};
