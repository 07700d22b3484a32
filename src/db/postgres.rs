use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use super::{EmployeeStore, StoreError};
use crate::models::employee::{Employee, EmployeeFilter};

const SELECT_EMPLOYEE: &str = "SELECT employee_id, full_name, nic_number, date_of_birth, age, sex, \
     district, permanent_address, temporary_address, contact_details, photo FROM employees";

#[derive(sqlx::FromRow)]
struct EmployeeRow {
    employee_id: Uuid,
    full_name: String,
    nic_number: String,
    date_of_birth: NaiveDate,
    age: i32,
    sex: String,
    district: String,
    permanent_address: String,
    temporary_address: String,
    contact_details: String,
    photo: Option<String>,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = StoreError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        let sex = row
            .sex
            .parse()
            .map_err(|err| StoreError::Corrupt(format!("employee {}: {}", row.employee_id, err)))?;
        Ok(Employee {
            id: row.employee_id,
            full_name: row.full_name,
            nic_number: row.nic_number,
            date_of_birth: row.date_of_birth,
            age: row.age,
            sex,
            district: row.district,
            permanent_address: row.permanent_address,
            temporary_address: row.temporary_address,
            contact_details: row.contact_details,
            photo: row.photo,
        })
    }
}

pub struct PgEmployeeStore {
    pool: PgPool,
}

impl PgEmployeeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeStore for PgEmployeeStore {
    async fn list(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, StoreError> {
        let mut query_builder: sqlx::QueryBuilder<'_, sqlx::Postgres> =
            sqlx::QueryBuilder::new(SELECT_EMPLOYEE);

        if let Some(nic) = filter.nic.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            // nic_number is stored upper-cased, so position() avoids LIKE escaping.
            query_builder.push(" WHERE position(");
            query_builder.push_bind(nic.to_uppercase());
            query_builder.push(" in nic_number) > 0");
        }
        query_builder.push(" ORDER BY created_at, employee_id");

        let rows: Vec<EmployeeRow> = query_builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Employee::try_from).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>, StoreError> {
        let row: Option<EmployeeRow> =
            sqlx::query_as(&format!("{} WHERE employee_id = $1", SELECT_EMPLOYEE))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Employee::try_from).transpose()
    }

    async fn find_by_nic(&self, nic_number: &str) -> Result<Option<Employee>, StoreError> {
        let row: Option<EmployeeRow> =
            sqlx::query_as(&format!("{} WHERE nic_number = $1", SELECT_EMPLOYEE))
                .bind(nic_number)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Employee::try_from).transpose()
    }

    async fn insert(&self, employee: &Employee) -> Result<Employee, StoreError> {
        sqlx::query(
            "INSERT INTO employees (employee_id, full_name, nic_number, date_of_birth, age, sex, \
             district, permanent_address, temporary_address, contact_details, photo) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(employee.id)
        .bind(&employee.full_name)
        .bind(&employee.nic_number)
        .bind(employee.date_of_birth)
        .bind(employee.age)
        .bind(employee.sex.as_str())
        .bind(&employee.district)
        .bind(&employee.permanent_address)
        .bind(&employee.temporary_address)
        .bind(&employee.contact_details)
        .bind(&employee.photo)
        .execute(&self.pool)
        .await?;

        self.find_by_id(employee.id)
            .await?
            .ok_or_else(|| StoreError::Backend(format!("employee {} vanished after insert", employee.id)))
    }

    async fn update(&self, employee: &Employee) -> Result<Option<Employee>, StoreError> {
        let mut query = sqlx::QueryBuilder::new("UPDATE employees SET");
        let mut separated = query.separated(", ");

        separated.push(" full_name = ");
        separated.push_bind_unseparated(&employee.full_name);
        separated.push("nic_number = ");
        separated.push_bind_unseparated(&employee.nic_number);
        separated.push("date_of_birth = ");
        separated.push_bind_unseparated(employee.date_of_birth);
        separated.push("age = ");
        separated.push_bind_unseparated(employee.age);
        separated.push("sex = ");
        separated.push_bind_unseparated(employee.sex.as_str());
        separated.push("district = ");
        separated.push_bind_unseparated(&employee.district);
        separated.push("permanent_address = ");
        separated.push_bind_unseparated(&employee.permanent_address);
        separated.push("temporary_address = ");
        separated.push_bind_unseparated(&employee.temporary_address);
        separated.push("contact_details = ");
        separated.push_bind_unseparated(&employee.contact_details);
        separated.push("photo = ");
        separated.push_bind_unseparated(&employee.photo);
        separated.push("updated_at = now()");
        query.push(" WHERE employee_id = ");
        query.push_bind(employee.id);

        let result = query.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(employee.id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM employees WHERE employee_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
