use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use log::{debug, info};
use uuid::Uuid;

use crate::db::EmployeeStore;
use crate::errors::AppError;
use crate::models::employee::{Employee, EmployeeFilter, EmployeePayload, Sex};
use crate::utils::validation::{
    derive_age, parse_date_of_birth, require_fields, validate_payload, REQUIRED_FIELDS,
};

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// CRUD over the employee store. Every mutation is validated before it
/// reaches the store.
#[derive(Clone)]
pub struct EmployeeService {
    store: Arc<dyn EmployeeStore>,
    today: fn() -> NaiveDate,
}

impl EmployeeService {
    pub fn new(store: Arc<dyn EmployeeStore>) -> Self {
        Self {
            store,
            today: utc_today,
        }
    }

    /// Replaces the clock used to derive ages.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub async fn list(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, AppError> {
        Ok(self.store.list(filter).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Employee, AppError> {
        let id = parse_id(id)?;
        self.store.find_by_id(id).await?.ok_or_else(not_found)
    }

    pub async fn create(&self, payload: EmployeePayload) -> Result<Employee, AppError> {
        let missing = require_fields(&payload.fields(), &REQUIRED_FIELDS);
        if !missing.is_empty() {
            return Err(AppError::missing_fields(&missing));
        }

        let payload = payload.normalized();
        validate_payload(&payload)?;

        let today = (self.today)();
        let (Some(full_name), Some(nic_number), Some(date_of_birth), Some(sex)) = (
            payload.full_name,
            payload.nic_number,
            payload.date_of_birth,
            payload.sex,
        ) else {
            return Err(AppError::missing_fields(&REQUIRED_FIELDS));
        };
        let date_of_birth = checked_date_of_birth(&date_of_birth, today)?;
        let sex = parse_sex(&sex)?;

        self.ensure_nic_available(&nic_number, None).await?;

        let employee = Employee {
            id: Uuid::new_v4(),
            full_name,
            nic_number,
            date_of_birth,
            age: derive_age(date_of_birth, today),
            sex,
            district: payload.district.unwrap_or_default(),
            permanent_address: payload.permanent_address.unwrap_or_default(),
            temporary_address: payload.temporary_address.unwrap_or_default(),
            contact_details: payload.contact_details.unwrap_or_default(),
            photo: payload.photo.filter(|p| !p.is_empty()),
        };

        let saved = self.store.insert(&employee).await?;
        info!("Created employee {} ({})", saved.id, saved.nic_number);
        Ok(saved)
    }

    /// Applies only the fields present in `payload`. Age is re-derived only
    /// when the date of birth is part of the update.
    pub async fn update(&self, id: &str, payload: EmployeePayload) -> Result<Employee, AppError> {
        let id = parse_id(id)?;
        let mut employee = self.store.find_by_id(id).await?.ok_or_else(not_found)?;

        let fields = payload.fields();
        let changing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|key| fields.iter().any(|(name, value)| name == key && value.is_some()))
            .collect();
        let blank = require_fields(&fields, &changing);
        if !blank.is_empty() {
            return Err(AppError::missing_fields(&blank));
        }

        let payload = payload.normalized();
        validate_payload(&payload)?;

        let today = (self.today)();
        let date_of_birth = payload
            .date_of_birth
            .as_deref()
            .map(|value| checked_date_of_birth(value, today))
            .transpose()?;
        let sex = payload.sex.as_deref().map(parse_sex).transpose()?;

        // Uniqueness is checked only once every field has validated.
        if let Some(nic_number) = payload.nic_number {
            if nic_number != employee.nic_number {
                self.ensure_nic_available(&nic_number, Some(employee.id)).await?;
                employee.nic_number = nic_number;
            }
        }
        if let Some(date_of_birth) = date_of_birth {
            employee.date_of_birth = date_of_birth;
            employee.age = derive_age(date_of_birth, today);
        }
        if let Some(sex) = sex {
            employee.sex = sex;
        }
        if let Some(full_name) = payload.full_name {
            employee.full_name = full_name;
        }
        if let Some(district) = payload.district {
            employee.district = district;
        }
        if let Some(permanent_address) = payload.permanent_address {
            employee.permanent_address = permanent_address;
        }
        if let Some(temporary_address) = payload.temporary_address {
            employee.temporary_address = temporary_address;
        }
        if let Some(contact_details) = payload.contact_details {
            employee.contact_details = contact_details;
        }
        if let Some(photo) = payload.photo {
            // An empty string clears the photo.
            employee.photo = Some(photo).filter(|p| !p.is_empty());
        }

        let saved = self.store.update(&employee).await?.ok_or_else(not_found)?;
        info!("Updated employee {}", saved.id);
        Ok(saved)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let id = parse_id(id)?;
        if !self.store.delete(id).await? {
            return Err(not_found());
        }
        info!("Deleted employee {}", id);
        Ok(())
    }

    async fn ensure_nic_available(&self, nic_number: &str, owner: Option<Uuid>) -> Result<(), AppError> {
        match self.store.find_by_nic(nic_number).await? {
            Some(existing) if Some(existing.id) != owner => {
                debug!("NIC {} already held by employee {}", nic_number, existing.id);
                Err(AppError::Conflict(
                    "An employee with this NIC number already exists".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Employee not found".to_string())
}

/// Ids that are not UUIDs cannot name a record, so they are simply unknown.
fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|_| not_found())
}

fn checked_date_of_birth(value: &str, today: NaiveDate) -> Result<NaiveDate, AppError> {
    let invalid = |message: &str| AppError::validation(message, vec!["dateOfBirth".to_string()]);
    let date = parse_date_of_birth(value)
        .ok_or_else(|| invalid("Date of birth must be a valid date (YYYY-MM-DD)"))?;
    if date > today {
        return Err(invalid("Date of birth cannot be in the future"));
    }
    Ok(date)
}

fn parse_sex(value: &str) -> Result<Sex, AppError> {
    value
        .parse()
        .map_err(|_| AppError::validation("Sex must be one of Male, Female or Other", vec!["sex".to_string()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryEmployeeStore;

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn service() -> EmployeeService {
        EmployeeService::new(Arc::new(MemoryEmployeeStore::default())).with_clock(fixed_today)
    }

    fn payload(nic: &str) -> EmployeePayload {
        EmployeePayload {
            full_name: Some("Nimal Perera".into()),
            nic_number: Some(nic.into()),
            date_of_birth: Some("2000-03-15".into()),
            sex: Some("Male".into()),
            district: Some("Colombo".into()),
            permanent_address: Some("5 Temple Rd, Colombo".into()),
            temporary_address: None,
            contact_details: Some("0771234567".into()),
            photo: None,
        }
    }

    #[tokio::test]
    async fn test_create_derives_age_and_normalizes() {
        let service = service();
        let mut input = payload(" 200012345v ");
        input.full_name = Some("  Nimal Perera  ".into());
        let created = service.create(input).await.unwrap();

        assert_eq!(created.nic_number, "200012345V");
        assert_eq!(created.full_name, "Nimal Perera");
        assert_eq!(created.age, 24);
        assert_eq!(created.temporary_address, "");
        assert_eq!(created.photo, None);
        assert_eq!(service.get(&created.id.to_string()).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_create_missing_fields_are_all_named() {
        let mut input = payload("123456789V");
        input.contact_details = None;
        input.district = Some("   ".into());
        let err = service().create(input).await.unwrap_err();
        assert_eq!(err.fields(), ["district", "contactDetails"]);
    }

    #[tokio::test]
    async fn test_create_rejects_malformed_nic() {
        let err = service().create(payload("12345678")).await.unwrap_err();
        assert_eq!(err.fields(), ["nicNumber"]);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_date_and_sex() {
        let mut input = payload("123456789V");
        input.date_of_birth = Some("2001-02-29".into());
        input.sex = Some("female".into());
        let err = service().create(input).await.unwrap_err();
        assert_eq!(err.fields(), ["dateOfBirth", "sex"]);
    }

    #[tokio::test]
    async fn test_create_rejects_future_date_of_birth() {
        let mut input = payload("123456789V");
        input.date_of_birth = Some("2024-03-16".into());
        let err = service().create(input).await.unwrap_err();
        assert_eq!(err.fields(), ["dateOfBirth"]);
    }

    #[tokio::test]
    async fn test_duplicate_nic_differing_in_case_conflicts() {
        let service = service();
        service.create(payload("200012345V")).await.unwrap();
        let err = service.create(payload("200012345v")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(service.list(&EmployeeFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_date_of_birth_only_changes_age() {
        let service = service();
        let before = service.create(payload("123456789V")).await.unwrap();
        let update = EmployeePayload {
            date_of_birth: Some("1990-01-01".into()),
            ..Default::default()
        };
        let after = service.update(&before.id.to_string(), update).await.unwrap();

        assert_eq!(after.age, 34);
        assert_ne!(after.age, before.age);
        assert_eq!(
            after,
            Employee {
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                age: 34,
                ..before
            }
        );
    }

    #[tokio::test]
    async fn test_update_without_date_keeps_age() {
        let service = service();
        let before = service.create(payload("123456789V")).await.unwrap();
        let update = EmployeePayload {
            district: Some("Kandy".into()),
            ..Default::default()
        };
        let after = service.update(&before.id.to_string(), update).await.unwrap();
        assert_eq!(after.district, "Kandy");
        assert_eq!(after.age, before.age);
    }

    #[tokio::test]
    async fn test_update_own_nic_is_not_a_conflict() {
        let service = service();
        let before = service.create(payload("123456789V")).await.unwrap();
        let update = EmployeePayload {
            nic_number: Some("123456789v".into()),
            ..Default::default()
        };
        let after = service.update(&before.id.to_string(), update).await.unwrap();
        assert_eq!(after.nic_number, "123456789V");
    }

    #[tokio::test]
    async fn test_update_to_taken_nic_conflicts() {
        let service = service();
        service.create(payload("111111111V")).await.unwrap();
        let second = service.create(payload("222222222V")).await.unwrap();
        let update = EmployeePayload {
            nic_number: Some("111111111v".into()),
            ..Default::default()
        };
        let err = service.update(&second.id.to_string(), update).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_validates_before_checking_nic() {
        let service = service();
        service.create(payload("111111111V")).await.unwrap();
        let second = service.create(payload("222222222V")).await.unwrap();
        let update = EmployeePayload {
            nic_number: Some("111111111V".into()),
            date_of_birth: Some("2030-01-01".into()),
            ..Default::default()
        };
        let err = service.update(&second.id.to_string(), update).await.unwrap_err();
        assert_eq!(err.fields(), ["dateOfBirth"]);

        let unchanged = service.get(&second.id.to_string()).await.unwrap();
        assert_eq!(unchanged, second);
    }

    #[tokio::test]
    async fn test_update_rejects_blank_required_field() {
        let service = service();
        let before = service.create(payload("123456789V")).await.unwrap();
        let update = EmployeePayload {
            full_name: Some("  ".into()),
            temporary_address: Some("".into()),
            ..Default::default()
        };
        let err = service.update(&before.id.to_string(), update).await.unwrap_err();
        assert_eq!(err.fields(), ["fullName"]);
    }

    #[tokio::test]
    async fn test_update_unknown_or_malformed_id() {
        let service = service();
        let err = service
            .update(&Uuid::new_v4().to_string(), EmployeePayload::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = service.update("not-an-id", EmployeePayload::default()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_empty_photo_clears_it() {
        let service = service();
        let mut input = payload("123456789V");
        input.photo = Some("iVBORw0KGgoAAAANSUhEUg==".into());
        let before = service.create(input).await.unwrap();
        assert!(before.photo.is_some());

        let update = EmployeePayload {
            photo: Some(String::new()),
            ..Default::default()
        };
        let after = service.update(&before.id.to_string(), update).await.unwrap();
        assert_eq!(after.photo, None);
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let service = service();
        let created = service.create(payload("123456789V")).await.unwrap();
        let id = created.id.to_string();
        service.delete(&id).await.unwrap();
        let err = service.delete(&id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_filters_by_nic() {
        let service = service();
        service.create(payload("111111111V")).await.unwrap();
        service.create(payload("222222222X")).await.unwrap();
        let filter = EmployeeFilter {
            nic: Some("22x".into()),
        };
        let found = service.list(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].nic_number, "222222222X");
    }
}
