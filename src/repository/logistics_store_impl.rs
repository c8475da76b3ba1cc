// ==========================================
// 物流管理系统 - 物流数据存储实现
// ==========================================
// 职责: 实现导入相关数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::{
    ClientRow, CollectionRow, ImportBatch, ItemRow, Owner, PersistedClient, PersistedCollection,
    PersistedItem, PersistedProduct, ProductRow, ProfileRow,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::logistics_store::{LogisticsStore, StoreTable};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

// ==========================================
// SqliteLogisticsStore
// ==========================================
pub struct SqliteLogisticsStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLogisticsStore {
    /// 打开数据库并初始化 schema
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与 ConfigManager 共享连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
            init_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(format!("锁获取失败: {}", e)))
    }

    /// INSERT ... ON CONFLICT(冲突键) DO NOTHING
    fn insert_skip_duplicates_sql(table: StoreTable, columns: &[&str]) -> String {
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) DO NOTHING",
            table.table_name(),
            columns.join(", "),
            placeholders,
            table.conflict_keys().join(", ")
        )
    }
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

fn get_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn get_parsed<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| conversion_error(idx, e))
}

const COLLECTION_COLUMNS: &str = "id, user_id, kind, status, parceiro, origin_address, origin_lat, \
     origin_lng, destination_address, destination_lat, destination_lng, requested_date, \
     freight_value, client_id, driver_id, carrier_id, responsible_user_id, created_at";

fn map_collection(row: &Row<'_>) -> rusqlite::Result<PersistedCollection> {
    Ok(PersistedCollection {
        id: row.get(0)?,
        row: CollectionRow {
            user_id: row.get(1)?,
            kind: get_parsed(row, 2)?,
            status: get_parsed(row, 3)?,
            parceiro: row.get(4)?,
            origin_address: row.get(5)?,
            origin_lat: row.get(6)?,
            origin_lng: row.get(7)?,
            destination_address: row.get(8)?,
            destination_lat: row.get(9)?,
            destination_lng: row.get(10)?,
            requested_date: row.get(11)?,
            freight_value: row.get(12)?,
            client_id: row.get(13)?,
            driver_id: row.get(14)?,
            carrier_id: row.get(15)?,
            responsible_user_id: row.get(16)?,
        },
        created_at: get_timestamp(row, 17)?,
    })
}

#[async_trait]
impl LogisticsStore for SqliteLogisticsStore {
    /// 批量新增揽收/派送（事务化）
    async fn insert_collections(
        &self,
        rows: Vec<CollectionRow>,
    ) -> RepositoryResult<Vec<PersistedCollection>> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let created_at = Utc::now();

        let mut persisted = Vec::with_capacity(rows.len());
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO collections ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, \
                 ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
                COLLECTION_COLUMNS
            ))?;

            for row in rows {
                let id = Uuid::new_v4().to_string();
                stmt.execute(params![
                    id,
                    row.user_id,
                    row.kind.as_str(),
                    row.status.as_str(),
                    row.parceiro,
                    row.origin_address,
                    row.origin_lat,
                    row.origin_lng,
                    row.destination_address,
                    row.destination_lat,
                    row.destination_lng,
                    row.requested_date,
                    row.freight_value,
                    row.client_id,
                    row.driver_id,
                    row.carrier_id,
                    row.responsible_user_id,
                    created_at.to_rfc3339(),
                ])?;
                persisted.push(PersistedCollection {
                    id,
                    row,
                    created_at,
                });
            }
        }

        tx.commit()?;
        Ok(persisted)
    }

    /// 批量新增明细行（事务化）
    async fn insert_items(&self, rows: Vec<ItemRow>) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let created_at = Utc::now().to_rfc3339();

        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO items (
                    id, collection_id, user_id, name, description, quantity, status, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )?;

            for row in &rows {
                stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    row.collection_id,
                    row.user_id,
                    row.name,
                    row.description,
                    row.quantity,
                    row.status.as_str(),
                    created_at,
                ])?;
                count += 1;
            }
        }

        tx.commit()?;
        Ok(count)
    }

    async fn upsert_products(&self, rows: Vec<ProductRow>) -> RepositoryResult<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let created_at = Utc::now().to_rfc3339();

        {
            let sql = Self::insert_skip_duplicates_sql(
                StoreTable::Products,
                &["id", "user_id", "code", "description", "model", "serial_number", "created_at"],
            );
            let mut stmt = tx.prepare(&sql)?;
            for row in &rows {
                stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    row.user_id,
                    row.code,
                    row.description,
                    row.model,
                    row.serial_number,
                    created_at,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    async fn upsert_clients(&self, rows: Vec<ClientRow>) -> RepositoryResult<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let created_at = Utc::now().to_rfc3339();

        {
            let sql = Self::insert_skip_duplicates_sql(
                StoreTable::Clients,
                &[
                    "id",
                    "user_id",
                    "name",
                    "phone",
                    "email",
                    "address",
                    "tax_id",
                    "contact_person",
                    "created_at",
                ],
            );
            let mut stmt = tx.prepare(&sql)?;
            for row in &rows {
                stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    row.user_id,
                    row.name,
                    row.phone,
                    row.email,
                    row.address,
                    row.tax_id,
                    row.contact_person,
                    created_at,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    async fn upsert_profiles(&self, rows: Vec<ProfileRow>) -> RepositoryResult<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let created_at = Utc::now().to_rfc3339();

        {
            let sql = Self::insert_skip_duplicates_sql(
                StoreTable::Profiles,
                &[
                    "id",
                    "user_id",
                    "first_name",
                    "last_name",
                    "phone",
                    "role",
                    "position",
                    "supervisor_id",
                    "shift",
                    "address",
                    "created_at",
                ],
            );
            let mut stmt = tx.prepare(&sql)?;
            for row in &rows {
                stmt.execute(params![
                    row.id,
                    row.user_id,
                    row.first_name,
                    row.last_name,
                    row.phone,
                    row.role.as_str(),
                    row.position,
                    row.supervisor_id,
                    row.shift,
                    row.address,
                    created_at,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    async fn insert_import_batch(&self, batch: ImportBatch) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, user_id, kind, file_name, submitted_rows,
                items_inserted, elapsed_ms, imported_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                batch.batch_id,
                batch.user_id,
                batch.kind.as_str(),
                batch.file_name,
                batch.submitted_rows as i64,
                batch.items_inserted as i64,
                batch.elapsed_ms,
                batch.imported_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn list_recent_batches(
        &self,
        owner: &Owner,
        limit: usize,
    ) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, user_id, kind, file_name, submitted_rows,
                   items_inserted, elapsed_ms, imported_at
            FROM import_batch
            WHERE user_id = ?1
            ORDER BY imported_at DESC
            LIMIT ?2
            "#,
        )?;

        let batches = stmt
            .query_map(params![owner.user_id, limit as i64], |row| {
                Ok(ImportBatch {
                    batch_id: row.get(0)?,
                    user_id: row.get(1)?,
                    kind: get_parsed(row, 2)?,
                    file_name: row.get(3)?,
                    submitted_rows: row.get::<_, i64>(4)? as usize,
                    items_inserted: row.get::<_, i64>(5)? as usize,
                    elapsed_ms: row.get(6)?,
                    imported_at: get_timestamp(row, 7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(batches)
    }

    async fn count_rows(&self, table: StoreTable, owner: &Owner) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE user_id = ?1", table.table_name()),
            params![owner.user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    async fn list_collections(&self, owner: &Owner) -> RepositoryResult<Vec<PersistedCollection>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM collections WHERE user_id = ?1 ORDER BY created_at, rowid",
            COLLECTION_COLUMNS
        ))?;

        let collections = stmt
            .query_map(params![owner.user_id], map_collection)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(collections)
    }

    async fn list_items_by_collection(
        &self,
        owner: &Owner,
        collection_id: &str,
    ) -> RepositoryResult<Vec<PersistedItem>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, collection_id, user_id, name, description, quantity, status, created_at
            FROM items
            WHERE user_id = ?1 AND collection_id = ?2
            ORDER BY rowid
            "#,
        )?;

        let items = stmt
            .query_map(params![owner.user_id, collection_id], |row| {
                Ok(PersistedItem {
                    id: row.get(0)?,
                    row: ItemRow {
                        collection_id: row.get(1)?,
                        user_id: row.get(2)?,
                        name: row.get(3)?,
                        description: row.get(4)?,
                        quantity: row.get(5)?,
                        status: get_parsed(row, 6)?,
                    },
                    created_at: get_timestamp(row, 7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    async fn find_product_by_code(
        &self,
        owner: &Owner,
        code: &str,
    ) -> RepositoryResult<Option<PersistedProduct>> {
        let conn = self.lock()?;
        let product = conn
            .query_row(
                r#"
                SELECT id, user_id, code, description, model, serial_number, created_at
                FROM products
                WHERE user_id = ?1 AND code = ?2
                "#,
                params![owner.user_id, code],
                |row| {
                    Ok(PersistedProduct {
                        id: row.get(0)?,
                        row: ProductRow {
                            user_id: row.get(1)?,
                            code: row.get(2)?,
                            description: row.get(3)?,
                            model: row.get(4)?,
                            serial_number: row.get(5)?,
                        },
                        created_at: get_timestamp(row, 6)?,
                    })
                },
            )
            .optional()?;

        Ok(product)
    }

    async fn find_client_by_name(
        &self,
        owner: &Owner,
        name: &str,
    ) -> RepositoryResult<Option<PersistedClient>> {
        let conn = self.lock()?;
        let client = conn
            .query_row(
                r#"
                SELECT id, user_id, name, phone, email, address, tax_id, contact_person, created_at
                FROM clients
                WHERE user_id = ?1 AND name = ?2
                "#,
                params![owner.user_id, name],
                |row| {
                    Ok(PersistedClient {
                        id: row.get(0)?,
                        row: ClientRow {
                            user_id: row.get(1)?,
                            name: row.get(2)?,
                            phone: row.get(3)?,
                            email: row.get(4)?,
                            address: row.get(5)?,
                            tax_id: row.get(6)?,
                            contact_person: row.get(7)?,
                        },
                        created_at: get_timestamp(row, 8)?,
                    })
                },
            )
            .optional()?;

        Ok(client)
    }

    async fn list_profiles(&self, owner: &Owner) -> RepositoryResult<Vec<ProfileRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, first_name, last_name, phone, role,
                   position, supervisor_id, shift, address
            FROM profiles
            WHERE user_id = ?1
            ORDER BY rowid
            "#,
        )?;

        let profiles = stmt
            .query_map(params![owner.user_id], |row| {
                Ok(ProfileRow {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    first_name: row.get(2)?,
                    last_name: row.get(3)?,
                    phone: row.get(4)?,
                    role: get_parsed(row, 5)?,
                    position: row.get(6)?,
                    supervisor_id: row.get(7)?,
                    shift: row.get(8)?,
                    address: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(profiles)
    }
}
