use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EmployeeStore, StoreError};
use crate::models::employee::{Employee, EmployeeFilter};

/// Non-persistent store kept in insertion order. Selected with `DATABASE_URL=memory://`.
#[derive(Default)]
pub struct MemoryEmployeeStore {
    records: RwLock<Vec<Employee>>,
}

impl MemoryEmployeeStore {
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn nic_taken(records: &[Employee], nic_number: &str, except: Uuid) -> bool {
    records
        .iter()
        .any(|e| e.id != except && e.nic_number == nic_number)
}

#[async_trait]
impl EmployeeStore for MemoryEmployeeStore {
    async fn list(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|e| filter.matches(e)).cloned().collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|e| e.id == id).cloned())
    }

    async fn find_by_nic(&self, nic_number: &str) -> Result<Option<Employee>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|e| e.nic_number == nic_number).cloned())
    }

    async fn insert(&self, employee: &Employee) -> Result<Employee, StoreError> {
        let mut records = self.records.write().await;
        if nic_taken(&records, &employee.nic_number, employee.id) {
            return Err(StoreError::UniqueViolation);
        }
        if records.iter().any(|e| e.id == employee.id) {
            return Err(StoreError::Backend(format!("duplicate id {}", employee.id)));
        }
        records.push(employee.clone());
        Ok(employee.clone())
    }

    async fn update(&self, employee: &Employee) -> Result<Option<Employee>, StoreError> {
        let mut records = self.records.write().await;
        if nic_taken(&records, &employee.nic_number, employee.id) {
            return Err(StoreError::UniqueViolation);
        }
        match records.iter_mut().find(|e| e.id == employee.id) {
            Some(slot) => {
                *slot = employee.clone();
                Ok(Some(employee.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|e| e.id != id);
        Ok(records.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::employee::Sex;
    use chrono::NaiveDate;

    fn employee(nic: &str) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            full_name: "Saman Kumara".into(),
            nic_number: nic.into(),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 6, 1).unwrap(),
            age: 39,
            sex: Sex::Male,
            district: "Galle".into(),
            permanent_address: "12 Beach Rd".into(),
            temporary_address: String::new(),
            contact_details: "0711111111".into(),
            photo: None,
        }
    }

    #[tokio::test]
    async fn test_insert_enforces_unique_nic() {
        let store = MemoryEmployeeStore::default();
        store.insert(&employee("123456789V")).await.unwrap();
        let err = store.insert(&employee("123456789V")).await.unwrap_err();
        assert_eq!(err, StoreError::UniqueViolation);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let store = MemoryEmployeeStore::default();
        let first = store.insert(&employee("111111111V")).await.unwrap();
        let second = store.insert(&employee("222222222V")).await.unwrap();
        let ids: Vec<Uuid> = store
            .list(&EmployeeFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_update_rejects_nic_of_other_record() {
        let store = MemoryEmployeeStore::default();
        store.insert(&employee("111111111V")).await.unwrap();
        let mut second = store.insert(&employee("222222222V")).await.unwrap();
        second.nic_number = "111111111V".into();
        assert_eq!(store.update(&second).await, Err(StoreError::UniqueViolation));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_record() {
        let store = MemoryEmployeeStore::default();
        let ghost = employee("333333333V");
        assert_eq!(store.update(&ghost).await, Ok(None));
        assert_eq!(store.delete(ghost.id).await, Ok(false));
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let store = MemoryEmployeeStore::default();
        let saved = store.insert(&employee("444444444V")).await.unwrap();
        assert_eq!(store.delete(saved.id).await, Ok(true));
        assert!(store.is_empty().await);
        assert_eq!(store.find_by_id(saved.id).await, Ok(None));
    }
}
