pub mod csv;
pub mod traits;

pub use traits::{
    AppointmentLineStorage, AppointmentStorage, BarberStorage, CommissionStorage, ServiceStorage,
    SubscriptionStorage,
};
