//! Upcoming-birthday window

use chrono::{Datelike, Days, NaiveDate};

use super::models::Contact;

/// Days ahead of today (inclusive) that count as "upcoming"
pub const BIRTHDAY_WINDOW_DAYS: u64 = 7;

/// The anniversary of `birthday` in `year`. Feb 29 falls back to Feb 28 in
/// common years.
fn anniversary(birthday: NaiveDate, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, birthday.month(), birthday.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, birthday.month(), birthday.day() - 1))
}

/// First anniversary of `birthday` on or after `today`
pub fn next_birthday(birthday: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
    let this_year = anniversary(birthday, today.year())?;
    if this_year >= today {
        Some(this_year)
    } else {
        anniversary(birthday, today.year() + 1)
    }
}

/// Contacts whose next birthday is within `[today, today + 7 days]`
pub fn upcoming(contacts: Vec<Contact>, today: NaiveDate) -> Vec<Contact> {
    let Some(window_end) = today.checked_add_days(Days::new(BIRTHDAY_WINDOW_DAYS)) else {
        return Vec::new();
    };

    contacts
        .into_iter()
        .filter(|c| {
            next_birthday(c.birthday, today).is_some_and(|next| next <= window_end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn contact(id: i32, birthday: NaiveDate) -> Contact {
        Contact {
            id,
            first_name: format!("c{}", id),
            last_name: "test".into(),
            email: format!("c{}@example.com", id),
            phone_number: format!("{}", id),
            birthday,
            user_id: 1,
        }
    }

    #[test]
    fn test_next_birthday_later_this_year() {
        assert_eq!(
            next_birthday(date(1990, 6, 10), date(2024, 6, 1)),
            Some(date(2024, 6, 10))
        );
    }

    #[test]
    fn test_next_birthday_rolls_to_next_year() {
        assert_eq!(
            next_birthday(date(1990, 1, 2), date(2024, 12, 30)),
            Some(date(2025, 1, 2))
        );
    }

    #[test]
    fn test_leap_day_in_common_year() {
        assert_eq!(
            next_birthday(date(2000, 2, 29), date(2023, 2, 1)),
            Some(date(2023, 2, 28))
        );
        assert_eq!(
            next_birthday(date(2000, 2, 29), date(2024, 2, 1)),
            Some(date(2024, 2, 29))
        );
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let today = date(2024, 6, 1);
        let contacts = vec![
            contact(1, date(1990, 6, 1)),  // today
            contact(2, date(1985, 6, 8)),  // today + 7
            contact(3, date(1985, 6, 9)),  // today + 8
            contact(4, date(1985, 5, 31)), // yesterday
        ];

        let ids: Vec<i32> = upcoming(contacts, today).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_window_crosses_new_year() {
        let today = date(2024, 12, 28);
        let contacts = vec![contact(1, date(1999, 1, 3)), contact(2, date(1999, 1, 5))];

        let ids: Vec<i32> = upcoming(contacts, today).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1]);
    }
}
