use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    Booking, BookingStatus, Notification, NotificationKind, OperatingHours, Turf, TurfStatus,
    User, UserRole,
};

const DT_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_dt(dt: &NaiveDateTime) -> String {
    dt.format(DT_FMT).to_string()
}

fn parse_dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DT_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Users ──

pub fn create_user(conn: &Connection, user: &User) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (id, name, email, role, phone, business_name, email_verified, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            user.id,
            user.name,
            user.email,
            user.role.as_str(),
            user.phone,
            user.business_name,
            user.email_verified as i32,
            user.is_active as i32,
            fmt_dt(&user.created_at),
        ],
    )?;
    Ok(())
}

/// Duplicate check used at registration: matches either the client-supplied
/// id or the (lowercased) email.
pub fn find_user_by_id_or_email(
    conn: &Connection,
    id: &str,
    email: &str,
) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        "SELECT id, name, email, role, phone, business_name, email_verified, is_active, created_at
         FROM users WHERE id = ?1 OR email = ?2",
        params![id, email],
        parse_user_row,
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn parse_user_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let role_str: String = row.get(3)?;
    let created_at_str: String = row.get(8)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: UserRole::parse(&role_str),
        phone: row.get(4)?,
        business_name: row.get(5)?,
        email_verified: row.get::<_, i32>(6)? != 0,
        is_active: row.get::<_, i32>(7)? != 0,
        created_at: parse_dt(&created_at_str),
    })
}

// ── Turfs ──

const TURF_COLS: &str = "id, owner_id, name, description, address, amenities, turf_type, \
     price_per_hour, max_players, hours, buffer_mins, slot_duration_mins, status, created_at, updated_at";

pub fn create_turf(conn: &Connection, turf: &Turf) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO turfs (id, owner_id, name, description, address, amenities, turf_type,
             price_per_hour, max_players, hours, buffer_mins, slot_duration_mins, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            turf.id,
            turf.owner_id,
            turf.name,
            turf.description,
            turf.address,
            serde_json::to_string(&turf.amenities)?,
            turf.turf_type,
            turf.price_per_hour,
            turf.max_players,
            turf.hours.to_json(),
            turf.buffer_mins,
            turf.slot_duration_mins,
            turf.status.as_str(),
            fmt_dt(&turf.created_at),
            fmt_dt(&turf.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_turf(conn: &Connection, turf: &Turf) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc();
    let count = conn.execute(
        "UPDATE turfs SET name = ?1, description = ?2, address = ?3, amenities = ?4,
             turf_type = ?5, price_per_hour = ?6, max_players = ?7, hours = ?8,
             buffer_mins = ?9, slot_duration_mins = ?10, status = ?11, updated_at = ?12
         WHERE id = ?13",
        params![
            turf.name,
            turf.description,
            turf.address,
            serde_json::to_string(&turf.amenities)?,
            turf.turf_type,
            turf.price_per_hour,
            turf.max_players,
            turf.hours.to_json(),
            turf.buffer_mins,
            turf.slot_duration_mins,
            turf.status.as_str(),
            fmt_dt(&now),
            turf.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_turf(conn: &Connection, id: &str) -> anyhow::Result<Option<Turf>> {
    let result = conn.query_row(
        &format!("SELECT {TURF_COLS} FROM turfs WHERE id = ?1"),
        params![id],
        parse_turf_row,
    );

    match result {
        Ok(turf) => Ok(Some(turf)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_active_turfs(conn: &Connection) -> anyhow::Result<Vec<Turf>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TURF_COLS} FROM turfs WHERE status = 'active' ORDER BY created_at ASC"
    ))?;
    let rows = stmt.query_map([], parse_turf_row)?;

    let mut turfs = vec![];
    for row in rows {
        turfs.push(row?);
    }
    Ok(turfs)
}

pub fn list_turfs_for_owner(conn: &Connection, owner_id: &str) -> anyhow::Result<Vec<Turf>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TURF_COLS} FROM turfs WHERE owner_id = ?1 ORDER BY created_at ASC"
    ))?;
    let rows = stmt.query_map(params![owner_id], parse_turf_row)?;

    let mut turfs = vec![];
    for row in rows {
        turfs.push(row?);
    }
    Ok(turfs)
}

fn parse_turf_row(row: &rusqlite::Row) -> rusqlite::Result<Turf> {
    let amenities_json: String = row.get(5)?;
    let hours_json: String = row.get(9)?;
    let status_str: String = row.get(12)?;
    let created_at_str: String = row.get(13)?;
    let updated_at_str: String = row.get(14)?;

    Ok(Turf {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        address: row.get(4)?,
        amenities: serde_json::from_str(&amenities_json).unwrap_or_default(),
        turf_type: row.get(6)?,
        price_per_hour: row.get(7)?,
        max_players: row.get(8)?,
        hours: serde_json::from_str(&hours_json)
            .unwrap_or(OperatingHours { windows: vec![] }),
        buffer_mins: row.get(10)?,
        slot_duration_mins: row.get(11)?,
        status: TurfStatus::parse(&status_str),
        created_at: parse_dt(&created_at_str),
        updated_at: parse_dt(&updated_at_str),
    })
}

// ── Bookings ──

const BOOKING_COLS: &str = "id, turf_id, user_id, user_name, phone, start_time, end_time, \
     price, status, payment_verified, created_at, updated_at";

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, turf_id, user_id, user_name, phone, start_time, end_time,
             price, status, payment_verified, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            booking.id,
            booking.turf_id,
            booking.user_id,
            booking.user_name,
            booking.phone,
            fmt_dt(&booking.start_time),
            fmt_dt(&booking.end_time),
            booking.price,
            booking.status.as_str(),
            booking.payment_verified as i32,
            fmt_dt(&booking.created_at),
            fmt_dt(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLS} FROM bookings WHERE id = ?1"),
        params![id],
        parse_booking_row,
    );

    match result {
        Ok(booking) => Ok(Some(booking)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Live (pending or confirmed) bookings for a turf whose interval touches
/// `[range_start, range_end)`. The caller pads the range by the turf buffer
/// so bookings just outside the day still count.
pub fn get_blocking_bookings(
    conn: &Connection,
    turf_id: &str,
    range_start: &NaiveDateTime,
    range_end: &NaiveDateTime,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLS} FROM bookings
         WHERE turf_id = ?1 AND status IN ('pending', 'confirmed')
           AND start_time < ?3 AND end_time > ?2
         ORDER BY start_time ASC"
    ))?;

    let rows = stmt.query_map(
        params![turf_id, fmt_dt(range_start), fmt_dt(range_end)],
        parse_booking_row,
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn list_bookings_for_turf(
    conn: &Connection,
    turf_id: &str,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLS} FROM bookings WHERE turf_id = ?1
         ORDER BY start_time DESC LIMIT ?2"
    ))?;
    let rows = stmt.query_map(params![turf_id, limit], parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let now = fmt_dt(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

pub fn set_payment_verified(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let now = fmt_dt(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET payment_verified = 1, updated_at = ?1 WHERE id = ?2",
        params![now, id],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> rusqlite::Result<Booking> {
    let start_str: String = row.get(5)?;
    let end_str: String = row.get(6)?;
    let status_str: String = row.get(8)?;
    let created_at_str: String = row.get(10)?;
    let updated_at_str: String = row.get(11)?;

    Ok(Booking {
        id: row.get(0)?,
        turf_id: row.get(1)?,
        user_id: row.get(2)?,
        user_name: row.get(3)?,
        phone: row.get(4)?,
        start_time: parse_dt(&start_str),
        end_time: parse_dt(&end_str),
        price: row.get(7)?,
        status: BookingStatus::parse(&status_str),
        payment_verified: row.get::<_, i32>(9)? != 0,
        created_at: parse_dt(&created_at_str),
        updated_at: parse_dt(&updated_at_str),
    })
}

// ── Notifications ──

pub fn insert_notification(
    conn: &Connection,
    owner_id: &str,
    kind: NotificationKind,
    title: &str,
    body: &str,
    booking_id: Option<&str>,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO notifications (owner_id, kind, title, body, booking_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![owner_id, kind.as_str(), title, body, booking_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_notifications(
    conn: &Connection,
    owner_id: &str,
    limit: i64,
) -> anyhow::Result<Vec<Notification>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, kind, title, body, booking_id, read, created_at
         FROM notifications WHERE owner_id = ?1
         ORDER BY id DESC LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![owner_id, limit], |row| {
        let kind_str: String = row.get(2)?;
        Ok(Notification {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            kind: NotificationKind::parse(&kind_str),
            title: row.get(3)?,
            body: row.get(4)?,
            booking_id: row.get(5)?,
            read: row.get::<_, i32>(6)? != 0,
            created_at: row.get(7)?,
        })
    })?;

    let mut notifications = vec![];
    for row in rows {
        notifications.push(row?);
    }
    Ok(notifications)
}

pub fn mark_notifications_read(conn: &Connection, owner_id: &str) -> anyhow::Result<usize> {
    let count = conn.execute(
        "UPDATE notifications SET read = 1 WHERE owner_id = ?1 AND read = 0",
        params![owner_id],
    )?;
    Ok(count)
}

// ── Owner summary ──

pub struct OwnerSummary {
    pub bookings_today: i64,
    pub upcoming_bookings: i64,
    pub pending_approvals: i64,
    pub earnings_today: i64,
    pub earnings_month: i64,
}

pub fn get_owner_summary(
    conn: &Connection,
    owner_id: &str,
    now: &NaiveDateTime,
) -> anyhow::Result<OwnerSummary> {
    let day = now.format("%Y-%m-%d").to_string();
    let month = now.format("%Y-%m").to_string();
    let now_str = fmt_dt(now);

    let bookings_today: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM bookings b JOIN turfs t ON b.turf_id = t.id
             WHERE t.owner_id = ?1 AND date(b.start_time) = ?2 AND b.status != 'cancelled'",
            params![owner_id, day],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let upcoming_bookings: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM bookings b JOIN turfs t ON b.turf_id = t.id
             WHERE t.owner_id = ?1 AND b.start_time > ?2 AND b.status = 'confirmed'",
            params![owner_id, now_str],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let pending_approvals: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM bookings b JOIN turfs t ON b.turf_id = t.id
             WHERE t.owner_id = ?1 AND b.status = 'pending'",
            params![owner_id],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let earnings_today: i64 = conn
        .query_row(
            "SELECT COALESCE(SUM(b.price), 0) FROM bookings b JOIN turfs t ON b.turf_id = t.id
             WHERE t.owner_id = ?1 AND date(b.start_time) = ?2
               AND b.status IN ('confirmed', 'completed')",
            params![owner_id, day],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let earnings_month: i64 = conn
        .query_row(
            "SELECT COALESCE(SUM(b.price), 0) FROM bookings b JOIN turfs t ON b.turf_id = t.id
             WHERE t.owner_id = ?1 AND strftime('%Y-%m', b.start_time) = ?2
               AND b.status IN ('confirmed', 'completed')",
            params![owner_id, month],
            |row| row.get(0),
        )
        .unwrap_or(0);

    Ok(OwnerSummary {
        bookings_today,
        upcoming_bookings,
        pending_approvals,
        earnings_today,
        earnings_month,
    })
}
