//! JSON wire types shared by the node server, its relay client and tests.

pub mod protocol;
