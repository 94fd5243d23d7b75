//! PostgreSQL account store
//!
//! Uses the legacy table layout (`usuario`, `cliente`, `empleado`,
//! `programador`) so existing databases keep working. Identifier columns may
//! be `SERIAL` or `BIGSERIAL`; every read and `RETURNING` clause casts to
//! `BIGINT`.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;

use super::AccountStore;
use crate::model::{NewUser, ProfileId, Role, RoleProfile, UserId, UserRecord, UserSummary};
use crate::{Result, StoreError};

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS usuario (
        idusuario BIGSERIAL PRIMARY KEY,
        nombre VARCHAR(255) NOT NULL,
        "contraseña" VARCHAR(255) NOT NULL,
        rol VARCHAR(20) NOT NULL
    )"#,
    "CREATE UNIQUE INDEX IF NOT EXISTS usuario_nombre_key ON usuario (nombre)",
    r#"CREATE TABLE IF NOT EXISTS cliente (
        idcliente BIGSERIAL PRIMARY KEY,
        usuario_idusuario BIGINT NOT NULL REFERENCES usuario (idusuario),
        direccion VARCHAR(255) NOT NULL,
        telefono VARCHAR(50) NOT NULL
    )"#,
    "CREATE UNIQUE INDEX IF NOT EXISTS cliente_usuario_idusuario_key ON cliente (usuario_idusuario)",
    r#"CREATE TABLE IF NOT EXISTS empleado (
        idempleado BIGSERIAL PRIMARY KEY,
        usuario_idusuario BIGINT NOT NULL REFERENCES usuario (idusuario),
        especialidad VARCHAR(255) NOT NULL,
        nombre_completo VARCHAR(255) NOT NULL,
        dni VARCHAR(50) NOT NULL,
        telefono VARCHAR(50) NOT NULL,
        direccion VARCHAR(255) NOT NULL,
        fecha_contratacion DATE
    )"#,
    "CREATE UNIQUE INDEX IF NOT EXISTS empleado_usuario_idusuario_key ON empleado (usuario_idusuario)",
    r#"CREATE TABLE IF NOT EXISTS programador (
        idprogramador BIGSERIAL PRIMARY KEY,
        usuario_idusuario BIGINT NOT NULL REFERENCES usuario (idusuario),
        dni VARCHAR(50) NOT NULL,
        telefono VARCHAR(50) NOT NULL,
        direccion VARCHAR(255) NOT NULL,
        fecha_contratacion DATE
    )"#,
    "CREATE UNIQUE INDEX IF NOT EXISTS programador_usuario_idusuario_key ON programador (usuario_idusuario)",
];

const USER_COLUMNS: &str =
    r#"idusuario::BIGINT AS id, nombre AS username, "contraseña" AS password_hash, rol AS role"#;

/// PostgreSQL account store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store connection
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Database(format!("PostgreSQL connection failed: {e}")))?;

        Ok(Self { pool })
    }

    /// Create tables and unique indexes if they do not exist yet
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::debug!("Account schema verified");
        Ok(())
    }
}

/// User row from database
#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    role: String,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self> {
        let role = parse_role(row.id, &row.role)?;
        Ok(UserRecord {
            id: UserId(row.id),
            username: row.username,
            password_hash: row.password_hash,
            role,
        })
    }
}

/// Credential-free user row
#[derive(Debug, FromRow)]
struct SummaryRow {
    id: i64,
    username: String,
    role: String,
}

impl TryFrom<SummaryRow> for UserSummary {
    type Error = StoreError;

    fn try_from(row: SummaryRow) -> Result<Self> {
        let role = parse_role(row.id, &row.role)?;
        Ok(UserSummary {
            id: UserId(row.id),
            username: row.username,
            role,
        })
    }
}

fn parse_role(id: i64, value: &str) -> Result<Role> {
    value
        .parse()
        .map_err(|_| StoreError::Corrupt(format!("user {id} has unknown role '{value}'")))
}

/// Table and primary key column holding profiles for `role`
fn profile_table(role: Role) -> (&'static str, &'static str) {
    match role {
        Role::Client => ("cliente", "idcliente"),
        Role::Employee => ("empleado", "idempleado"),
        Role::Programmer => ("programador", "idprogramador"),
    }
}

/// `INSERT` for exactly the given columns, returning the generated id
fn insert_sql(role: Role, columns: &[&str]) -> String {
    let (table, id_column) = profile_table(role);
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${i}")).collect();
    format!(
        "INSERT INTO {table} ({}) VALUES ({}) RETURNING {id_column}::BIGINT",
        columns.join(", "),
        placeholders.join(", ")
    )
}

#[async_trait]
impl AccountStore for PgStore {
    async fn insert_user(&self, user: &NewUser) -> Result<UserId> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO usuario (nombre, "contraseña", rol)
            VALUES ($1, $2, $3)
            RETURNING idusuario::BIGINT
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(UserId(row.0))
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM usuario WHERE idusuario = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM usuario WHERE nombre = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn update_password_hash(&self, id: UserId, password_hash: &str) -> Result<()> {
        sqlx::query(r#"UPDATE usuario SET "contraseña" = $1 WHERE idusuario = $2"#)
            .bind(password_hash)
            .bind(id.get())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>> {
        let rows: Vec<SummaryRow> = sqlx::query_as(
            r#"
            SELECT idusuario::BIGINT AS id, nombre AS username, rol AS role
            FROM usuario
            ORDER BY idusuario ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserSummary::try_from).collect()
    }

    async fn find_profile(&self, role: Role, user_id: UserId) -> Result<Option<ProfileId>> {
        let (table, id_column) = profile_table(role);
        let sql = format!(
            "SELECT {id_column}::BIGINT FROM {table} WHERE usuario_idusuario = $1 LIMIT 1"
        );
        let row: Option<(i64,)> = sqlx::query_as(&sql)
            .bind(user_id.get())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(id,)| ProfileId(id)))
    }

    async fn insert_profile(&self, profile: &RoleProfile) -> Result<ProfileId> {
        let role = profile.role();

        let row: (i64,) = match profile {
            RoleProfile::Client(p) => {
                let sql = insert_sql(role, &["usuario_idusuario", "direccion", "telefono"]);
                sqlx::query_as(&sql)
                    .bind(p.user_id.get())
                    .bind(&p.address)
                    .bind(&p.phone)
                    .fetch_one(&self.pool)
                    .await?
            }
            RoleProfile::Employee(p) => {
                let mut columns = vec![
                    "usuario_idusuario",
                    "especialidad",
                    "nombre_completo",
                    "dni",
                    "telefono",
                    "direccion",
                ];
                if p.hire_date.is_some() {
                    columns.push("fecha_contratacion");
                }
                let sql = insert_sql(role, &columns);
                let mut query = sqlx::query_as::<_, (i64,)>(&sql)
                    .bind(p.user_id.get())
                    .bind(&p.specialty)
                    .bind(&p.full_name)
                    .bind(&p.national_id)
                    .bind(&p.phone)
                    .bind(&p.address);
                if let Some(date) = p.hire_date {
                    query = query.bind(date);
                }
                query.fetch_one(&self.pool).await?
            }
            RoleProfile::Programmer(p) => {
                let mut columns = vec!["usuario_idusuario", "dni", "telefono", "direccion"];
                if p.hire_date.is_some() {
                    columns.push("fecha_contratacion");
                }
                let sql = insert_sql(role, &columns);
                let mut query = sqlx::query_as::<_, (i64,)>(&sql)
                    .bind(p.user_id.get())
                    .bind(&p.national_id)
                    .bind(&p.phone)
                    .bind(&p.address);
                if let Some(date) = p.hire_date {
                    query = query.bind(date);
                }
                query.fetch_one(&self.pool).await?
            }
        };

        Ok(ProfileId(row.0))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClientProfile, EmployeeProfile};

    #[test]
    fn test_insert_sql_omits_unlisted_columns() {
        let sql = insert_sql(
            Role::Programmer,
            &["usuario_idusuario", "dni", "telefono", "direccion"],
        );
        assert_eq!(
            sql,
            "INSERT INTO programador (usuario_idusuario, dni, telefono, direccion) \
             VALUES ($1, $2, $3, $4) RETURNING idprogramador::BIGINT"
        );
        assert!(!sql.contains("fecha_contratacion"));
    }

    #[test]
    fn test_unknown_role_row_is_corrupt() {
        let row = UserRow {
            id: 3,
            username: "x".to_string(),
            password_hash: "h".to_string(),
            role: "admin".to_string(),
        };
        assert!(matches!(
            UserRecord::try_from(row),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL instance at DATABASE_URL"]
    async fn test_pg_round_trip() {
        let url = std::env::var("DATABASE_URL").unwrap();
        let store = PgStore::new(&url, 2).await.unwrap();
        store.ensure_schema().await.unwrap();
        // Idempotent
        store.ensure_schema().await.unwrap();

        let suffix = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let username = format!("pg-test-{suffix}");
        let id = store
            .insert_user(&NewUser {
                username: username.clone(),
                password_hash: "digest".to_string(),
                role: Role::Employee,
            })
            .await
            .unwrap();

        let user = store.find_user_by_username(&username).await.unwrap().unwrap();
        assert_eq!(user.id, id);

        let employee = RoleProfile::from(EmployeeProfile {
            user_id: id,
            specialty: "cirugia".to_string(),
            full_name: "Eva Ruiz".to_string(),
            national_id: "1".to_string(),
            phone: "2".to_string(),
            address: "3".to_string(),
            hire_date: None,
        });
        let profile_id = store.insert_profile(&employee).await.unwrap();
        assert_eq!(
            store.find_profile(Role::Employee, id).await.unwrap(),
            Some(profile_id)
        );

        let err = store.insert_profile(&employee).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));

        // The store itself does not check role agreement
        let client = RoleProfile::from(ClientProfile {
            user_id: id,
            address: "a".to_string(),
            phone: "p".to_string(),
        });
        assert!(store.insert_profile(&client).await.is_ok());
    }
}
