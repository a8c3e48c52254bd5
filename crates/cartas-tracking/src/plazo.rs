use chrono::{DateTime, Local, NaiveDate, Utc};

/// Whether a letter is still within its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plazo {
    EnPlazo,
    FueraDePlazo,
}

impl Plazo {
    pub fn label(self) -> &'static str {
        match self {
            Self::EnPlazo => "En plazo",
            Self::FueraDePlazo => "Fuera de plazo",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::EnPlazo => "badge bg-green-100 text-green-800",
            Self::FueraDePlazo => "badge bg-red-100 text-red-800",
        }
    }
}

/// Overdue only when a due date exists and falls strictly before `hoy`.
/// Both sides are calendar dates, so a letter due today is still on time.
pub fn comparar_fechas(vencimiento: Option<NaiveDate>, hoy: NaiveDate) -> Plazo {
    match vencimiento {
        Some(fecha) if fecha < hoy => Plazo::FueraDePlazo,
        _ => Plazo::EnPlazo,
    }
}

/// Calendar date of an API timestamp in the server's local timezone.
pub fn fecha_local(ts: DateTime<Utc>) -> NaiveDate {
    ts.with_timezone(&Local).date_naive()
}

/// Today's date in the server's local timezone.
pub fn hoy() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn no_deadline_is_on_time() {
        assert_eq!(comparar_fechas(None, d(2024, 5, 10)), Plazo::EnPlazo);
    }

    #[test]
    fn due_today_is_on_time() {
        assert_eq!(comparar_fechas(Some(d(2024, 5, 10)), d(2024, 5, 10)), Plazo::EnPlazo);
    }

    #[test]
    fn past_due_is_overdue() {
        let plazo = comparar_fechas(Some(d(2024, 5, 9)), d(2024, 5, 10));
        assert_eq!(plazo, Plazo::FueraDePlazo);
        assert_eq!(plazo.label(), "Fuera de plazo");
    }

    #[test]
    fn future_deadline_is_on_time() {
        let plazo = comparar_fechas(Some(d(2025, 1, 1)), d(2024, 12, 31));
        assert_eq!(plazo, Plazo::EnPlazo);
        assert_eq!(plazo.label(), "En plazo");
    }

    #[test]
    fn time_of_day_is_ignored() {
        let ts = Local
            .with_ymd_and_hms(2024, 5, 10, 23, 59, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(fecha_local(ts), d(2024, 5, 10));
        assert_eq!(comparar_fechas(Some(fecha_local(ts)), d(2024, 5, 10)), Plazo::EnPlazo);
    }
}
