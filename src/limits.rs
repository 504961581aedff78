/// Max bytes for names, logins, and passwords.
pub const MAX_NAME_LEN: usize = 256;

/// Max bytes for booking and room descriptions.
pub const MAX_DESCRIPTION_LEN: usize = 1024;

/// Rooms shown in the usage ranking.
pub const RANKING_SIZE: usize = 5;

/// Bookings shown in the recent activity list.
pub const RECENT_ACTIVITY_SIZE: usize = 5;

/// Business hours per day assumed by the utilization rate.
pub const BUSINESS_HOURS_PER_DAY: f64 = 8.0;

/// Business days per month assumed by the utilization rate.
pub const BUSINESS_DAYS_PER_MONTH: f64 = 22.0;
