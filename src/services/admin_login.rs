use uuid::Uuid;

use crate::error::AppError;
use crate::services::TotpService;

/// insert_if_absent の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// 2FAクレデンシャルストア
///
/// アカウントごとに最大1件。一意性はストア側（主キー制約）で保証すること。
/// 本番実装は AdminTwoFactorRepository。テストではインメモリ実装に差し替える。
#[allow(async_fn_in_trait)]
pub trait CredentialStore {
    /// 暗号化済みシークレットを取得
    async fn find(&self, user_id: Uuid) -> Result<Option<Vec<u8>>, AppError>;

    /// クレデンシャルが存在しない場合のみ挿入
    async fn insert_if_absent(
        &self,
        user_id: Uuid,
        secret_encrypted: &[u8],
    ) -> Result<InsertOutcome, AppError>;
}

/// パスワード認証成功後の2FAチャレンジ
#[derive(Debug)]
pub enum TwoFactorChallenge {
    /// クレデンシャル未登録。provisioning URI をスキャンさせてから
    /// 再ログインでコード検証を受ける（この時点ではセッションを発行しない）
    SetupRequired {
        otpauth_url: String,
        /// QRコードPNG（Base64）
        qr_code: String,
    },
    /// クレデンシャル登録済み。コード検証待ち
    CodeRequired,
}

/// 管理者ログインの2FAフロー
///
/// 状態遷移:
/// PasswordVerified → { SetupRequired | CodeRequired } → FullyAuthenticated
///
/// セッション発行は verify 成功後に呼び出し側が行う。登録だけ済ませた
/// ログインが認証デバイスの所持を証明せずに通過することはない。
#[derive(Clone)]
pub struct AdminLoginService<S: CredentialStore> {
    store: S,
    totp: TotpService,
}

impl<S: CredentialStore> AdminLoginService<S> {
    pub fn new(store: S, totp: TotpService) -> Self {
        Self { store, totp }
    }

    /// パスワード認証済みの管理者に対する2FAチャレンジを決定する
    ///
    /// クレデンシャルがなければその場で生成・保存する。同一アカウントの
    /// 同時登録（ブラウザタブ2枚など）で挿入が競合した場合は、先に
    /// 書き込まれたシークレットを読み直して採用する。ユーザーにエラーは返さない。
    pub async fn begin(&self, user_id: Uuid, email: &str) -> Result<TwoFactorChallenge, AppError> {
        if self.store.find(user_id).await?.is_some() {
            return Ok(TwoFactorChallenge::CodeRequired);
        }

        let secret = TotpService::generate_secret();
        let encrypted = self.totp.encrypt_secret(&secret)?;

        let secret = match self.store.insert_if_absent(user_id, &encrypted).await? {
            InsertOutcome::Inserted => {
                tracing::info!(user_id = %user_id, "2FAクレデンシャル登録");
                secret
            }
            InsertOutcome::AlreadyExists => {
                tracing::info!(user_id = %user_id, "2FA登録競合: 既存シークレットを採用");
                let existing = self.store.find(user_id).await?.ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!(
                        "credential disappeared after insert conflict"
                    ))
                })?;
                self.totp.decrypt_secret(&existing)?
            }
        };

        let otpauth_url = self.totp.provisioning_uri(email, &secret);
        let qr_code = self.totp.qr_code_base64(email, &secret)?;

        Ok(TwoFactorChallenge::SetupRequired {
            otpauth_url,
            qr_code,
        })
    }

    /// 提出されたTOTPコードを検証する
    ///
    /// # Security
    /// クレデンシャル未登録・コード不一致はどちらも TotpInvalid
    /// （アカウント列挙の手掛かりを与えない）
    pub async fn verify(&self, user_id: Uuid, code: &str) -> Result<(), AppError> {
        let encrypted = self
            .store
            .find(user_id)
            .await?
            .ok_or(AppError::TotpInvalid)?;

        let secret = self.totp.decrypt_secret(&encrypted)?;

        match self.totp.verify_code(&secret, code)? {
            Some(delta) => {
                if delta != 0 {
                    tracing::debug!(user_id = %user_id, delta, "時刻ずれを許容して2FA検証成功");
                }
                tracing::info!(user_id = %user_id, "2FA検証成功");
                Ok(())
            }
            None => {
                tracing::warn!(user_id = %user_id, "2FA検証失敗");
                Err(AppError::TotpInvalid)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::sync::atomic::{AtomicBool, Ordering};

    use base64::{Engine as _, engine::general_purpose::STANDARD};

    use super::*;

    /// インメモリのクレデンシャルストア
    ///
    /// insert_if_absent はロック下で実行され、DBの主キー制約と同じ
    /// 先勝ちセマンティクスを持つ
    #[derive(Clone, Default)]
    struct MemoryStore {
        rows: Arc<Mutex<HashMap<Uuid, Vec<u8>>>>,
    }

    impl CredentialStore for MemoryStore {
        async fn find(&self, user_id: Uuid) -> Result<Option<Vec<u8>>, AppError> {
            Ok(self.rows.lock().unwrap().get(&user_id).cloned())
        }

        async fn insert_if_absent(
            &self,
            user_id: Uuid,
            secret_encrypted: &[u8],
        ) -> Result<InsertOutcome, AppError> {
            let mut rows = self.rows.lock().unwrap();
            if rows.contains_key(&user_id) {
                return Ok(InsertOutcome::AlreadyExists);
            }
            rows.insert(user_id, secret_encrypted.to_vec());
            Ok(InsertOutcome::Inserted)
        }
    }

    /// 初回の find だけ「未登録」を報告するストア
    ///
    /// ブラウザタブ2枚の同時ログインを決定的に再現する:
    /// find は absent を返すが insert は既存行と競合する
    #[derive(Clone)]
    struct RacingStore {
        inner: MemoryStore,
        first_find: Arc<AtomicBool>,
    }

    impl CredentialStore for RacingStore {
        async fn find(&self, user_id: Uuid) -> Result<Option<Vec<u8>>, AppError> {
            if self.first_find.swap(false, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find(user_id).await
        }

        async fn insert_if_absent(
            &self,
            user_id: Uuid,
            secret_encrypted: &[u8],
        ) -> Result<InsertOutcome, AppError> {
            self.inner.insert_if_absent(user_id, secret_encrypted).await
        }
    }

    fn test_totp_service() -> TotpService {
        let key_base64 = STANDARD.encode([0u8; 32]);
        TotpService::new("TestStore".to_string(), &key_base64).unwrap()
    }

    fn secret_param(otpauth_url: &str) -> String {
        otpauth_url
            .split("secret=")
            .nth(1)
            .and_then(|s| s.split('&').next())
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_begin_enrolls_new_credential() {
        let store = MemoryStore::default();
        let service = AdminLoginService::new(store.clone(), test_totp_service());
        let user_id = Uuid::new_v4();

        let challenge = service.begin(user_id, "admin@example.com").await.unwrap();

        match challenge {
            TwoFactorChallenge::SetupRequired {
                otpauth_url,
                qr_code,
            } => {
                assert!(otpauth_url.starts_with("otpauth://totp/"));
                assert!(!qr_code.is_empty());
            }
            TwoFactorChallenge::CodeRequired => panic!("expected SetupRequired"),
        }

        // クレデンシャルが保存されている
        assert_eq!(store.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_begin_with_existing_credential_requires_code() {
        let store = MemoryStore::default();
        let service = AdminLoginService::new(store.clone(), test_totp_service());
        let user_id = Uuid::new_v4();

        service.begin(user_id, "admin@example.com").await.unwrap();
        let second = service.begin(user_id, "admin@example.com").await.unwrap();

        assert!(matches!(second, TwoFactorChallenge::CodeRequired));
        // 再生成されていない
        assert_eq!(store.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_begin_recovers_from_insert_conflict() {
        let totp = test_totp_service();
        let inner = MemoryStore::default();
        let user_id = Uuid::new_v4();

        // 別タブが先に登録を済ませている
        let winner_secret = TotpService::generate_secret();
        let encrypted = totp.encrypt_secret(&winner_secret).unwrap();
        inner
            .insert_if_absent(user_id, &encrypted)
            .await
            .unwrap();

        let store = RacingStore {
            inner: inner.clone(),
            first_find: Arc::new(AtomicBool::new(true)),
        };
        let service = AdminLoginService::new(store, totp);

        // find は absent → insert は競合 → 既存シークレットで URI を構築
        let challenge = service.begin(user_id, "admin@example.com").await.unwrap();
        match challenge {
            TwoFactorChallenge::SetupRequired { otpauth_url, .. } => {
                assert_eq!(secret_param(&otpauth_url), winner_secret);
            }
            TwoFactorChallenge::CodeRequired => panic!("expected SetupRequired"),
        }

        // 行は1件のまま
        assert_eq!(inner.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_begin_converges_on_one_secret() {
        let store = MemoryStore::default();
        let service_a = AdminLoginService::new(store.clone(), test_totp_service());
        let service_b = AdminLoginService::new(store.clone(), test_totp_service());
        let user_id = Uuid::new_v4();

        let (a, b) = tokio::join!(
            service_a.begin(user_id, "admin@example.com"),
            service_b.begin(user_id, "admin@example.com"),
        );

        // どちらのフローも失敗せず、保存されたシークレットは1件
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(store.rows.lock().unwrap().len(), 1);

        // SetupRequired を受け取った側のURIはすべて同じシークレットを埋め込む
        let totp = test_totp_service();
        let stored = store.find(user_id).await.unwrap().unwrap();
        let stored_secret = totp.decrypt_secret(&stored).unwrap();
        for challenge in [a, b] {
            if let TwoFactorChallenge::SetupRequired { otpauth_url, .. } = challenge {
                assert_eq!(secret_param(&otpauth_url), stored_secret);
            }
        }
    }

    #[tokio::test]
    async fn test_verify_accepts_current_code() {
        let store = MemoryStore::default();
        let totp = test_totp_service();
        let service = AdminLoginService::new(store.clone(), totp.clone());
        let user_id = Uuid::new_v4();

        let secret = TotpService::generate_secret();
        let encrypted = totp.encrypt_secret(&secret).unwrap();
        store.insert_if_absent(user_id, &encrypted).await.unwrap();

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let code = totp.generate_at(&secret, now).unwrap();

        service.verify(user_id, &code).await.unwrap();
    }

    #[tokio::test]
    async fn test_verify_rejects_wrong_code() {
        let store = MemoryStore::default();
        let totp = test_totp_service();
        let service = AdminLoginService::new(store.clone(), totp.clone());
        let user_id = Uuid::new_v4();

        let secret = TotpService::generate_secret();
        let encrypted = totp.encrypt_secret(&secret).unwrap();
        store.insert_if_absent(user_id, &encrypted).await.unwrap();

        // 許容ウィンドウ内のどの候補とも一致しないコードを作る
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let candidates: Vec<String> = [now.saturating_sub(60), now - 30, now, now + 30, now + 60]
            .iter()
            .map(|t| totp.generate_at(&secret, *t).unwrap())
            .collect();
        let wrong = (0..1_000_000)
            .map(|n| format!("{:06}", n))
            .find(|c| !candidates.contains(c))
            .unwrap();

        let result = service.verify(user_id, &wrong).await;
        assert!(matches!(result, Err(AppError::TotpInvalid)));
    }

    #[tokio::test]
    async fn test_verify_without_credential_is_generic_failure() {
        let store = MemoryStore::default();
        let service = AdminLoginService::new(store, test_totp_service());

        let result = service.verify(Uuid::new_v4(), "123456").await;
        assert!(matches!(result, Err(AppError::TotpInvalid)));
    }

    #[tokio::test]
    async fn test_verify_rejects_malformed_code_without_panic() {
        let store = MemoryStore::default();
        let totp = test_totp_service();
        let service = AdminLoginService::new(store.clone(), totp.clone());
        let user_id = Uuid::new_v4();

        let encrypted = totp
            .encrypt_secret(&TotpService::generate_secret())
            .unwrap();
        store.insert_if_absent(user_id, &encrypted).await.unwrap();

        for code in ["", "12345", "12345a", "1234567"] {
            let result = service.verify(user_id, code).await;
            assert!(matches!(result, Err(AppError::TotpInvalid)));
        }
    }
}
