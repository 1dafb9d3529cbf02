pub mod booking;
pub mod film;
pub mod hall;
pub mod notification;
pub mod seat;
pub mod session;
pub mod user;

pub use booking::{Booking, BookingDetails};
pub use film::Film;
pub use hall::Hall;
pub use notification::Notification;
pub use seat::{Seat, SeatAvailability};
pub use session::{FilmSession, Session, SessionDetails};
pub use user::User;
