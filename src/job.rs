//! Job files: the persistent, per-site record of generation parameters.
//!
//! A job lives at `{jobs_root}/{identifier}_{slug}/hospital_job.json`. Its JSON
//! shape is a durable contract read and written by other tools, so new fields
//! must always default when absent.

mod model;
mod overrides;
mod policy;
mod store;

pub use model::{
    AoiSpec, GroundSpec, HelipadSpec, HospitalSpec, Job, LightingSpec, OutputSpec, PropsSpec,
    Quality,
};
pub use overrides::{
    GroundOverrides, HelipadOverrides, HospitalOverrides, JobOverrides, LightingOverrides,
    OutputOverrides, PropsOverrides,
};
pub use policy::Policy;
pub use store::{JobStore, StoredJob, JOB_FILE_NAME};
