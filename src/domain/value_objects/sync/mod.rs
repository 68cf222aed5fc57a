pub mod entity_id;
pub mod entity_type;
pub mod operation_id;
pub mod operation_status;
pub mod operation_type;
pub mod payload;
pub mod trip_id;
pub mod version;

pub use entity_id::EntityId;
pub use entity_type::EntityType;
pub use operation_id::OperationId;
pub use operation_status::OperationStatus;
pub use operation_type::OperationType;
pub use payload::OperationPayload;
pub use trip_id::TripId;
pub use version::Version;
