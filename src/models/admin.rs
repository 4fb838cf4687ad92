use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Admin {
    pub id: i32,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
}

impl Admin {
    // Найти активного администратора по email
    pub async fn find_active_by_email(
        email: &str,
        db: &crate::database::Database,
    ) -> Result<Option<Admin>, sqlx::Error> {
        sqlx::query_as::<_, Admin>(
            "SELECT id, email, password_hash, is_active FROM admins WHERE email = $1 AND is_active",
        )
        .bind(email)
        .fetch_optional(&db.pool)
        .await
    }

    // Проверить пароль по bcrypt-хешу. Неверный формат хеша считаем несовпадением
    pub fn verify_password(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.password_hash).unwrap_or(false)
    }
}
