//! Wire types shared by the staff API and the backend calls behind it.
//!
//! Field names on the wire follow the backend's column names.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tatame_core::{ClassGroupId, PaymentId, PlanId, StudentId, TrialClassId};

/// Offset applied to schedule timestamps stored without a zone (Brasília time).
const ACADEMY_UTC_OFFSET_SECONDS: i32 = -3 * 3600;

/// Row returned by the student listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StudentSummary {
    pub id: StudentId,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "telefone", default)]
    pub phone: Option<String>,
    #[serde(rename = "ativo", default)]
    pub active: bool,
    #[serde(rename = "dia_vencimento", default)]
    pub due_day: Option<i32>,
    #[serde(rename = "plano_nome", default)]
    pub plan_name: Option<String>,
    #[serde(rename = "turma_nome", default)]
    pub class_name: Option<String>,
}

/// Full student record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "telefone", default)]
    pub phone: Option<String>,
    #[serde(rename = "data_nascimento", default)]
    pub birth_date: Option<String>,
    #[serde(rename = "plano_id", default)]
    pub plan_id: Option<PlanId>,
    #[serde(rename = "turma_id", default)]
    pub class_group_id: Option<ClassGroupId>,
    #[serde(rename = "dia_vencimento", default)]
    pub due_day: Option<i32>,
    #[serde(rename = "ativo", default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Plan name and price joined onto a student's own record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanBrief {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "valor", default)]
    pub price: Option<f64>,
}

/// Class group schedule joined onto a student's own record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassSchedule {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "dias_semana", default)]
    pub weekdays: Option<String>,
    #[serde(rename = "hora_inicio", default)]
    pub starts_at: Option<String>,
    #[serde(rename = "hora_fim", default)]
    pub ends_at: Option<String>,
}

/// The signed-in student's record with its plan and class group.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: StudentId,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "telefone", default)]
    pub phone: Option<String>,
    #[serde(rename = "dia_vencimento", default)]
    pub due_day: Option<i32>,
    #[serde(rename = "planos", default, deserialize_with = "embedded_one")]
    pub plan: Option<PlanBrief>,
    #[serde(rename = "turmas", default, deserialize_with = "embedded_one")]
    pub class_group: Option<ClassSchedule>,
}

/// One entry of a student's payment history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    #[serde(rename = "mes_referencia", default)]
    pub reference_month: Option<String>,
    #[serde(rename = "data_vencimento")]
    pub due_date: String,
    #[serde(rename = "data_pagamento", default)]
    pub paid_on: Option<String>,
    pub status: String,
    #[serde(rename = "valor", default)]
    pub amount: Option<f64>,
}

/// Embedded relations arrive as an object, a one-element array, or null.
fn embedded_one<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Embedded<T> {
        One(T),
        Many(Vec<T>),
    }

    Ok(
        match Option::<Embedded<T>>::deserialize(deserializer)? {
            None => None,
            Some(Embedded::One(item)) => Some(item),
            Some(Embedded::Many(items)) => items.into_iter().next(),
        },
    )
}

/// Student form, used both to create and to edit.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StudentInput {
    #[serde(rename = "nome", default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "telefone", default)]
    pub phone: Option<String>,
    #[serde(rename = "data_nascimento", default)]
    pub birth_date: Option<String>,
    #[serde(rename = "plano_id", default)]
    pub plan_id: Option<PlanId>,
    #[serde(rename = "turma_id", default)]
    pub class_group_id: Option<ClassGroupId>,
    #[serde(rename = "dia_vencimento", default)]
    pub due_day: Option<i32>,
    #[serde(rename = "ativo", default = "default_active")]
    pub active: bool,
}

impl StudentInput {
    /// Checks required fields and the due day range.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message describing the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name is required.".to_string());
        }
        if self.email.trim().is_empty() {
            return Err("Email is required.".to_string());
        }
        if self.due_day.is_some_and(|day| !(1..=31).contains(&day)) {
            return Err("Due day must be between 1 and 31.".to_string());
        }
        Ok(())
    }
}

/// Turns blank optional text into `None`.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Paid plan offered by the academy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "valor", default)]
    pub price: Option<f64>,
}

/// Class group with its weekly schedule.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassGroup {
    pub id: ClassGroupId,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "dias_semana", default)]
    pub weekdays: Option<String>,
    #[serde(rename = "hora_inicio", default)]
    pub starts_at: Option<String>,
    #[serde(rename = "hora_fim", default)]
    pub ends_at: Option<String>,
}

/// Calendar month as named by the fee procedures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Month {
    #[serde(rename = "jan")]
    January,
    #[serde(rename = "fev")]
    February,
    #[serde(rename = "mar")]
    March,
    #[serde(rename = "abr")]
    April,
    #[serde(rename = "mai")]
    May,
    #[serde(rename = "jun")]
    June,
    #[serde(rename = "jul")]
    July,
    #[serde(rename = "ago")]
    August,
    #[serde(rename = "set")]
    September,
    #[serde(rename = "outubro")]
    October,
    #[serde(rename = "nov")]
    November,
    #[serde(rename = "dez")]
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Name used by the backend for this month's column and parameter.
    #[must_use]
    pub fn as_wire(self) -> &'static str {
        match self {
            Month::January => "jan",
            Month::February => "fev",
            Month::March => "mar",
            Month::April => "abr",
            Month::May => "mai",
            Month::June => "jun",
            Month::July => "jul",
            Month::August => "ago",
            Month::September => "set",
            Month::October => "outubro",
            Month::November => "nov",
            Month::December => "dez",
        }
    }
}

/// Paid flag per month of one year.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaidMonths {
    #[serde(default)]
    pub jan: bool,
    #[serde(default)]
    pub fev: bool,
    #[serde(default)]
    pub mar: bool,
    #[serde(default)]
    pub abr: bool,
    #[serde(default)]
    pub mai: bool,
    #[serde(default)]
    pub jun: bool,
    #[serde(default)]
    pub jul: bool,
    #[serde(default)]
    pub ago: bool,
    #[serde(default)]
    pub set: bool,
    #[serde(default)]
    pub outubro: bool,
    #[serde(default)]
    pub nov: bool,
    #[serde(default)]
    pub dez: bool,
}

impl PaidMonths {
    #[must_use]
    pub fn is_paid(&self, month: Month) -> bool {
        match month {
            Month::January => self.jan,
            Month::February => self.fev,
            Month::March => self.mar,
            Month::April => self.abr,
            Month::May => self.mai,
            Month::June => self.jun,
            Month::July => self.jul,
            Month::August => self.ago,
            Month::September => self.set,
            Month::October => self.outubro,
            Month::November => self.nov,
            Month::December => self.dez,
        }
    }
}

/// One student's fee grid for a year.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeeRow {
    #[serde(rename = "aluno_id")]
    pub student_id: StudentId,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "telefone", default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "dia_vencimento", default)]
    pub due_day: Option<i32>,
    #[serde(rename = "plano_nome", default)]
    pub plan_name: Option<String>,
    #[serde(rename = "turma_nome", default)]
    pub class_name: Option<String>,
    #[serde(flatten)]
    pub paid: PaidMonths,
}

/// Request to mark a month paid or unpaid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeeToggle {
    pub student_id: StudentId,
    pub year: i32,
    pub month: Month,
    pub paid: bool,
}

/// Contact details of the person booked for a trial class.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrialStudent {
    #[serde(rename = "nome", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "telefone", default)]
    pub phone: Option<String>,
}

/// Booked trial class.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrialClass {
    pub id: TrialClassId,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(rename = "agendado_para")]
    pub scheduled_for: String,
    pub status: String,
    #[serde(rename = "aluno_id", default)]
    pub student_id: Option<StudentId>,
    #[serde(rename = "alunos", default)]
    pub student: Option<TrialStudent>,
}

impl TrialClass {
    /// Parses the scheduled time; zone-less values are academy local time.
    #[must_use]
    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.scheduled_for)
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(&Utc));
    }
    if let Ok(at) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(at.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())?;
    let offset = FixedOffset::east_opt(ACADEMY_UTC_OFFSET_SECONDS)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|at| at.with_timezone(&Utc))
}

/// Time window filter for trial classes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeWindow {
    /// Scheduled now or later.
    #[default]
    #[serde(rename = "proximas")]
    Upcoming,
    /// Scheduled before now.
    #[serde(rename = "passadas")]
    Past,
    #[serde(rename = "todas")]
    All,
}

/// Status value that matches every trial class.
pub const ANY_STATUS: &str = "todos";

/// Query for the trial class list.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TrialClassFilter {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub when: TimeWindow,
}

impl TrialClassFilter {
    /// Returns true if `class` passes both the status and the time filter.
    #[must_use]
    pub fn matches(&self, class: &TrialClass, now: DateTime<Utc>) -> bool {
        let status_matches = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some(ANY_STATUS) => true,
            Some(status) => class.status == status,
        };
        if !status_matches {
            return false;
        }

        match self.when {
            TimeWindow::All => true,
            TimeWindow::Upcoming => class.scheduled_at().is_some_and(|at| at >= now),
            TimeWindow::Past => class.scheduled_at().is_some_and(|at| at < now),
        }
    }
}

/// Form to book a trial class for a prospective student.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NewTrialClass {
    #[serde(rename = "nome", default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "telefone", default)]
    pub phone: Option<String>,
    #[serde(rename = "data_nascimento", default)]
    pub birth_date: Option<String>,
    #[serde(rename = "plano_id", default)]
    pub plan_id: Option<PlanId>,
    #[serde(rename = "turma_id", default)]
    pub class_group_id: Option<ClassGroupId>,
    #[serde(rename = "dia_vencimento", default)]
    pub due_day: Option<i32>,
    /// Local date and time as `YYYY-MM-DDTHH:MM`.
    #[serde(rename = "agendado_para", default)]
    pub scheduled_for: Option<String>,
}

/// Converts a `YYYY-MM-DDTHH:MM` form value into the `YYYY-MM-DD HH:MM:00`
/// form the booking procedure expects. The value stays in local time.
pub fn schedule_for_backend(input: &str) -> Option<String> {
    let naive = NaiveDateTime::parse_from_str(input.trim(), "%Y-%m-%dT%H:%M").ok()?;
    Some(naive.format("%Y-%m-%d %H:%M:00").to_string())
}
