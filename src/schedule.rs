//! The fixed medication plan both patients follow.

use crate::models::{Frequency, Patient, ScheduledMedicine};

const fn daily(
    id: &'static str,
    patient: Patient,
    time: &'static str,
    name: &'static str,
    dose: &'static str,
) -> ScheduledMedicine {
    ScheduledMedicine {
        id,
        patient,
        time,
        name,
        dose,
        frequency: Frequency::Daily,
        notes: None,
    }
}

const fn on_days(
    id: &'static str,
    patient: Patient,
    time: &'static str,
    name: &'static str,
    dose: &'static str,
    days: &'static [u8],
) -> ScheduledMedicine {
    ScheduledMedicine {
        id,
        patient,
        time,
        name,
        dose,
        frequency: Frequency::Days { days },
        notes: None,
    }
}

pub static MEDICATION_SCHEDULE: &[ScheduledMedicine] = &[
    // Jorge
    daily("j-08-00-novet", Patient::Jorge, "08:00", "Novet", "1 dosis"),
    daily("j-12-00-silodosina", Patient::Jorge, "12:00", "Silodosina", "1 tab"),
    daily("j-12-00-aeon", Patient::Jorge, "12:00", "Aeon Digestopan", "1 tab"),
    daily("j-12-00-corplus", Patient::Jorge, "12:00", "Corplus", "1 tab"),
    daily("j-12-00-anon", Patient::Jorge, "12:00", "Anon", "inhalación"),
    daily("j-13-00-xigduo", Patient::Jorge, "13:00", "Xig Duo", "1 tab"),
    daily("j-13-00-osteoblaskol", Patient::Jorge, "13:00", "Osteoblaskol", "1 tab"),
    on_days("j-13-00-daflon", Patient::Jorge, "13:00", "Daflón", "1 dosis", &[1, 3, 5]),
    daily("j-17-00-digestotal", Patient::Jorge, "17:00", "Digestotal", "1 dosis"),
    daily("j-19-00-hiprostan", Patient::Jorge, "19:00", "Hiprostan D", "1 tab"),
    daily("j-19-00-tapris", Patient::Jorge, "19:00", "Tapris 50 mg", "½ tab"),
    daily("j-20-00-xarelto", Patient::Jorge, "20:00", "Xarelto 10 mg", "1 dosis"),
    on_days("j-20-00-lipanon", Patient::Jorge, "20:00", "Lipanon", "½ tab", &[1, 3, 5]),
    daily("j-20-00-dexlanzopral", Patient::Jorge, "20:00", "Dexlanzopral", "1 tab"),
    daily("j-20-00-apevitin", Patient::Jorge, "20:00", "APEVITIN BC", "jarabe"),
    // Teresa
    daily("t-07-00-eutirox", Patient::Teresa, "07:00", "Eutirox 75 mg", "1 dosis"),
    daily("t-08-00-tiriarita", Patient::Teresa, "08:00", "Tiriarita 10 mg", "1 dosis"),
    daily("t-08-00-concor", Patient::Teresa, "08:00", "Concor 1,25 mg", "1 dosis"),
    daily("t-08-00-omeprazol", Patient::Teresa, "08:00", "Omeprazol 20 mg", "1 dosis"),
    daily("t-09-00-corplus", Patient::Teresa, "09:00", "Corplus", "1 dosis"),
    daily("t-09-00-densibon", Patient::Teresa, "09:00", "Densibon D", "1 dosis"),
    on_days("t-10-00-alopurinol", Patient::Teresa, "10:00", "Alopurinol", "½ tab", &[1, 3, 5]),
    daily("t-10-00-olanzapina-1", Patient::Teresa, "10:00", "Olanzapina", "½ tab"),
    daily("t-12-00-espiolto", Patient::Teresa, "12:00", "Espiolto", "inhalación"),
    daily("t-12-00-apracal-1", Patient::Teresa, "12:00", "Apracal", "3 gotas"),
    on_days("t-13-00-daflon", Patient::Teresa, "13:00", "Daflón", "1 dosis", &[1, 3, 5]),
    daily("t-17-00-olanzapina-2", Patient::Teresa, "17:00", "Olanzapina 7,5 mg", "1 dosis"),
    daily("t-18-00-paxil", Patient::Teresa, "18:00", "Paxil 20 mg", "1 dosis"),
    daily("t-20-00-concor", Patient::Teresa, "20:00", "Concor 1,25 mg", "1 dosis"),
    daily("t-20-00-expansia", Patient::Teresa, "20:00", "Expansia 75 mg", "1 dosis"),
    daily("t-20-00-lipator", Patient::Teresa, "20:00", "Lipator 10 mg", "1 dosis"),
    daily("t-20-00-ribastick", Patient::Teresa, "20:00", "Ribastick", "parche"),
    daily("t-21-00-apracal-2", Patient::Teresa, "21:00", "Apracal", "5 gotas"),
    daily("t-21-00-lactulosa", Patient::Teresa, "21:00", "Lactulosa", "1 dosis"),
];

/// Looks up a scheduled dose by its id.
pub fn find(id: &str) -> Option<&'static ScheduledMedicine> {
    MEDICATION_SCHEDULE.iter().find(|m| m.id == id)
}
