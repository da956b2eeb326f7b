//! Sample data generators used when the store is unreachable or empty.
//!
//! Row counts and field shapes are fixed; dates, amounts and statuses are
//! random. Every generated id starts with `sample-` so sample rows are never
//! mistaken for persisted ones.

use chrono::{Duration, NaiveDate, NaiveTime};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{
    Appointment, AppointmentStatus, EntryStatus, EntryType, FinancialEntry, FinancialEntryDraft,
    Lead, LeadStatus, Temperature,
};

pub const SAMPLE_ENTRY_COUNT: usize = 40;
pub const SAMPLE_LEAD_COUNT: usize = 25;
pub const SAMPLE_APPOINTMENT_COUNT: usize = 18;
/// Sample rows fall within this many days before `today`.
pub const SAMPLE_WINDOW_DAYS: i64 = 30;

pub const SAMPLE_ID_PREFIX: &str = "sample-";

const PATIENTS: &[&str] = &[
    "Ana Souza",
    "Bruno Lima",
    "Carla Mendes",
    "Diego Ferreira",
    "Elisa Rocha",
    "Fernanda Alves",
    "Gustavo Ribeiro",
    "Helena Costa",
    "Igor Martins",
    "Juliana Pereira",
];

const PROCEDURES: &[&str] = &[
    "Initial consultation",
    "Follow-up visit",
    "Botox application",
    "Facial harmonization",
    "Dental cleaning",
    "Teeth whitening",
];

const EXPENSE_CATEGORIES: &[(&str, &str)] = &[
    ("Marketing", "Meta Ads top-up"),
    ("Marketing", "Google Ads top-up"),
    ("Rent", "Clinic rent"),
    ("Payroll", "Staff salaries"),
    ("Supplies", "Medical supplies"),
    ("Utilities", "Electricity and internet"),
];

const LAST_MESSAGES: &[&str] = &[
    "Hi, how much is a consultation?",
    "Do you have availability next week?",
    "Can I pay in installments?",
    "Thanks, I'll think about it.",
    "Confirmed for Tuesday!",
];

fn recent_date<R: Rng + ?Sized>(today: NaiveDate, rng: &mut R) -> NaiveDate {
    today - Duration::days(rng.gen_range(0..SAMPLE_WINDOW_DAYS))
}

fn pick<'a, R: Rng + ?Sized>(items: &[&'a str], rng: &mut R) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

/// Round to the nearest ten, the way clinic prices are quoted.
fn price<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    (rng.gen_range(low..high) / 10.0).round() * 10.0
}

pub fn sample_entries<R: Rng + ?Sized>(today: NaiveDate, rng: &mut R) -> Vec<FinancialEntry> {
    (0..SAMPLE_ENTRY_COUNT)
        .map(|i| {
            let status = match rng.gen_range(0..100) {
                0..=79 => EntryStatus::Effected,
                80..=94 => EntryStatus::Overdue,
                _ => EntryStatus::Cancelled,
            };

            let draft = if rng.gen_bool(0.6) {
                let unit_value = price(rng, 300.0, 1500.0);
                let discount = if rng.gen_bool(0.25) {
                    (unit_value * 0.1).round()
                } else {
                    0.0
                };
                FinancialEntryDraft {
                    date: recent_date(today, rng),
                    entry_type: EntryType::Receivable,
                    category: if rng.gen_bool(0.5) {
                        "Consultation".to_string()
                    } else {
                        "Procedure".to_string()
                    },
                    name: format!("{} - {}", pick(PROCEDURES, rng), pick(PATIENTS, rng)),
                    unit_value,
                    discount,
                    addition: 0.0,
                    status,
                }
            } else {
                let (category, name) = *EXPENSE_CATEGORIES
                    .choose(rng)
                    .unwrap_or(&EXPENSE_CATEGORIES[0]);
                FinancialEntryDraft {
                    date: recent_date(today, rng),
                    entry_type: EntryType::Payable,
                    category: category.to_string(),
                    name: name.to_string(),
                    unit_value: price(rng, 100.0, 2500.0),
                    discount: 0.0,
                    addition: if rng.gen_bool(0.1) {
                        price(rng, 10.0, 60.0)
                    } else {
                        0.0
                    },
                    status,
                }
            };

            FinancialEntry::new(format!("{}entry-{}", SAMPLE_ID_PREFIX, i + 1), draft)
        })
        .collect()
}

pub fn sample_leads<R: Rng + ?Sized>(today: NaiveDate, rng: &mut R) -> Vec<Lead> {
    (0..SAMPLE_LEAD_COUNT)
        .map(|i| {
            let status = match rng.gen_range(0..100) {
                0..=29 => LeadStatus::New,
                30..=54 => LeadStatus::InConversation,
                55..=74 => LeadStatus::Scheduled,
                75..=89 => LeadStatus::Sale,
                _ => LeadStatus::Lost,
            };
            let temperature = *[Temperature::Hot, Temperature::Warm, Temperature::Cold]
                .choose(rng)
                .unwrap_or(&Temperature::Warm);
            let time = NaiveTime::from_hms_opt(rng.gen_range(8..20), rng.gen_range(0..60), 0)
                .unwrap_or_default();

            Lead {
                id: format!("{}lead-{}", SAMPLE_ID_PREFIX, i + 1),
                name: pick(PATIENTS, rng).to_string(),
                phone: format!(
                    "(11) 9{:04}-{:04}",
                    rng.gen_range(0..10_000),
                    rng.gen_range(0..10_000)
                ),
                status,
                temperature,
                last_message: pick(LAST_MESSAGES, rng).to_string(),
                potential_value: price(rng, 450.0, 3000.0),
                created_at: recent_date(today, rng).and_time(time).and_utc(),
            }
        })
        .collect()
}

pub fn sample_appointments<R: Rng + ?Sized>(today: NaiveDate, rng: &mut R) -> Vec<Appointment> {
    let mut appointments: Vec<Appointment> = (0..SAMPLE_APPOINTMENT_COUNT)
        .map(|i| {
            let date = recent_date(today, rng);
            let status = if date == today {
                AppointmentStatus::Confirmed
            } else {
                match rng.gen_range(0..100) {
                    0..=69 => AppointmentStatus::Done,
                    70..=79 => AppointmentStatus::Cancelled,
                    _ => AppointmentStatus::Confirmed,
                }
            };
            let minute = if rng.gen_bool(0.5) { 0 } else { 30 };

            Appointment {
                id: format!("{}appointment-{}", SAMPLE_ID_PREFIX, i + 1),
                date,
                time: format!("{:02}:{:02}", rng.gen_range(8..18), minute),
                patient_name: pick(PATIENTS, rng).to_string(),
                kind: pick(PROCEDURES, rng).to_string(),
                status,
                is_google: false,
            }
        })
        .collect();

    appointments.sort_by(|a, b| (a.date, &a.time).cmp(&(b.date, &b.time)));
    appointments
}
