//! One module per workflow step; each adds its operation to `PrincipleService`.

mod aggregation;
mod applicant;
mod asset;
mod emergency;
mod financing;
