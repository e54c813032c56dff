use aes_gcm::{
    Aes256Gcm, KeyInit, Nonce,
    aead::{Aead, OsRng},
};
use data_encoding::BASE32_NOPAD;
use rand::RngCore;
use totp_rs::{Algorithm, TOTP};

use crate::error::AppError;

/// コード桁数
const DIGITS: usize = 6;
/// タイムステップ（秒）
const PERIOD: u64 = 30;
/// デフォルトの許容ウィンドウ（前後ステップ数）
const DEFAULT_WINDOW: u8 = 1;
/// ウィンドウの上限。これ以上広げるとワンタイム性が実質的に失われる
const MAX_WINDOW: u8 = 2;

/// TOTP (Time-based One-Time Password) サービス
///
/// # Security
/// - シークレットはAES-256-GCMで暗号化してDB保存
/// - シークレット平文・provisioning URI・コードはログに出力しない
#[derive(Clone)]
pub struct TotpService {
    issuer: String,
    encryption_key: [u8; 32],
}

impl TotpService {
    /// 新しい TotpService を作成
    ///
    /// # Arguments
    /// * `issuer` - TOTP発行者名（認証アプリに表示される）
    /// * `encryption_key_base64` - Base64エンコードされた32バイトの暗号化キー
    pub fn new(issuer: String, encryption_key_base64: &str) -> Result<Self, AppError> {
        use base64::{Engine as _, engine::general_purpose::STANDARD};

        let key_bytes = STANDARD.decode(encryption_key_base64).map_err(|e| {
            tracing::error!(error = ?e, "TOTP暗号化キーのBase64デコードエラー");
            AppError::Internal(anyhow::anyhow!("invalid encryption key format"))
        })?;

        if key_bytes.len() != 32 {
            tracing::error!(
                expected = 32,
                actual = key_bytes.len(),
                "TOTP暗号化キーの長さが不正"
            );
            return Err(AppError::Internal(anyhow::anyhow!(
                "encryption key must be 32 bytes"
            )));
        }

        let mut encryption_key = [0u8; 32];
        encryption_key.copy_from_slice(&key_bytes);

        Ok(Self {
            issuer,
            encryption_key,
        })
    }

    /// 20バイト（160ビット）のランダムシークレットを生成し、Base32でエンコード
    ///
    /// # Note
    /// thread_rng は CSPRNG。乱数源が利用できない場合は panic するため、
    /// 弱いシークレットで処理が続行されることはない。
    pub fn generate_secret() -> String {
        let mut bytes = [0u8; 20];
        rand::thread_rng().fill_bytes(&mut bytes);
        BASE32_NOPAD.encode(&bytes)
    }

    /// シークレットをAES-256-GCMで暗号化
    ///
    /// # Returns
    /// 96ビットnonce (12バイト) + 暗号文
    pub fn encrypt_secret(&self, secret: &str) -> Result<Vec<u8>, AppError> {
        let cipher = Aes256Gcm::new_from_slice(&self.encryption_key).map_err(|e| {
            tracing::error!(error = ?e, "AES-GCM暗号化器の初期化エラー");
            AppError::Internal(anyhow::anyhow!("cipher initialization error"))
        })?;

        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher.encrypt(nonce, secret.as_bytes()).map_err(|e| {
            tracing::error!(error = ?e, "シークレット暗号化エラー");
            AppError::Internal(anyhow::anyhow!("encryption error"))
        })?;

        let mut result = Vec::with_capacity(12 + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);

        Ok(result)
    }

    /// 暗号化されたシークレットを復号
    pub fn decrypt_secret(&self, encrypted: &[u8]) -> Result<String, AppError> {
        if encrypted.len() < 12 {
            tracing::error!(len = encrypted.len(), "暗号化データが短すぎる");
            return Err(AppError::Internal(anyhow::anyhow!(
                "encrypted data too short"
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(&self.encryption_key).map_err(|e| {
            tracing::error!(error = ?e, "AES-GCM暗号化器の初期化エラー");
            AppError::Internal(anyhow::anyhow!("cipher initialization error"))
        })?;

        let (nonce_bytes, ciphertext) = encrypted.split_at(12);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher.decrypt(nonce, ciphertext).map_err(|e| {
            tracing::error!(error = ?e, "シークレット復号エラー");
            AppError::Internal(anyhow::anyhow!("decryption error"))
        })?;

        String::from_utf8(plaintext).map_err(|e| {
            tracing::error!(error = ?e, "復号データのUTF-8変換エラー");
            AppError::Internal(anyhow::anyhow!("invalid utf8 after decryption"))
        })
    }

    /// otpauth:// 形式の provisioning URI を構築
    ///
    /// # Security
    /// URIはシークレットそのものと等価。登録画面への一度きりの返却以外で
    /// 保存・送信・ログ出力してはならない。
    ///
    /// # Note
    /// issuer・ラベル（メールアドレス）はパーセントエンコードする。
    /// ':' を含むラベルも拒否せずエンコードする。
    /// secret は検証に使うものと同一のBase32文字列をそのまま埋め込む。
    pub fn provisioning_uri(&self, email: &str, secret: &str) -> String {
        format!(
            "otpauth://totp/{issuer}:{label}?secret={secret}&issuer={issuer}&algorithm=SHA1&digits={digits}&period={period}",
            issuer = percent_encode(&self.issuer),
            label = percent_encode(email),
            secret = secret,
            digits = DIGITS,
            period = PERIOD,
        )
    }

    /// QRコードを生成（PNG形式、Base64エンコード）
    ///
    /// # Arguments
    /// * `email` - ユーザーのメールアドレス（アカウント識別子）
    /// * `secret` - Base32エンコードされたシークレット
    pub fn qr_code_base64(&self, email: &str, secret: &str) -> Result<String, AppError> {
        let totp = self.create_totp(email, secret)?;

        totp.get_qr_base64().map_err(|e| {
            tracing::error!(error = %e, "QRコード生成エラー");
            AppError::Internal(anyhow::anyhow!("qr code generation error"))
        })
    }

    /// TOTPコードを現在時刻で検証（前後1ステップを許容）
    ///
    /// # Returns
    /// 一致したタイムステップのオフセット（0 = 現在、-1 = 1ステップ前 …）。
    /// 不一致は None。
    pub fn verify_code(&self, secret: &str, code: &str) -> Result<Option<i8>, AppError> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| {
                tracing::error!(error = ?e, "システム時刻取得エラー");
                AppError::Internal(anyhow::anyhow!("system time error"))
            })?
            .as_secs();

        self.verify_at(secret, code, DEFAULT_WINDOW, now)
    }

    /// TOTPコードを指定時刻で検証
    ///
    /// 候補は T からの距離が近い順（0, -1, +1, -2, +2）に照合する。
    /// 同一入力に対する結果は決定的。
    ///
    /// # Note
    /// - 6桁の数字でない入力は候補を計算せず即拒否
    /// - コードは先頭ゼロを保持したまま文字列として定数時間比較
    /// - ウィンドウは MAX_WINDOW (±2) で頭打ち
    pub fn verify_at(
        &self,
        secret: &str,
        code: &str,
        window: u8,
        unix_time: u64,
    ) -> Result<Option<i8>, AppError> {
        if code.len() != DIGITS || !code.chars().all(|c| c.is_ascii_digit()) {
            return Ok(None);
        }

        let window = i64::from(window.min(MAX_WINDOW));

        let mut deltas = vec![0i64];
        for w in 1..=window {
            deltas.push(-w);
            deltas.push(w);
        }

        for delta in deltas {
            let Some(candidate_time) = checked_step(unix_time, delta) else {
                // Unixエポック以前になる候補はスキップ
                continue;
            };

            let expected = self.generate_at(secret, candidate_time)?;
            if constant_time_eq(expected.as_bytes(), code.as_bytes()) {
                return Ok(Some(delta as i8));
            }
        }

        Ok(None)
    }

    /// 指定時刻の期待コードを計算（検証の内部処理・テスト用）
    pub(crate) fn generate_at(&self, secret: &str, unix_time: u64) -> Result<String, AppError> {
        let totp = self.create_totp_for_verify(secret)?;
        Ok(totp.generate(unix_time))
    }

    /// TOTP オブジェクトを作成（provisioning URI / QRコード生成用）
    fn create_totp(&self, email: &str, secret: &str) -> Result<TOTP, AppError> {
        let secret_bytes = decode_secret(secret)?;

        // new_unchecked: パラメータは固定値、ラベルのURLエンコードは get_url 側で行われる
        Ok(TOTP::new_unchecked(
            Algorithm::SHA1,
            DIGITS,
            0,
            PERIOD,
            secret_bytes,
            Some(self.issuer.clone()),
            email.to_string(),
        ))
    }

    /// TOTP オブジェクトを作成（検証用、ラベル不要）
    fn create_totp_for_verify(&self, secret: &str) -> Result<TOTP, AppError> {
        let secret_bytes = decode_secret(secret)?;

        Ok(TOTP::new_unchecked(
            Algorithm::SHA1,
            DIGITS,
            0,
            PERIOD,
            secret_bytes,
            None,
            String::new(),
        ))
    }
}

/// Base32シークレットをデコード
fn decode_secret(secret: &str) -> Result<Vec<u8>, AppError> {
    BASE32_NOPAD
        .decode(secret.trim_end_matches('=').as_bytes())
        .map_err(|e| {
            tracing::error!(error = ?e, "シークレットのBase32デコードエラー");
            AppError::Internal(anyhow::anyhow!("invalid base32 secret"))
        })
}

/// unix_time + delta ステップの時刻を計算（負になる場合は None）
fn checked_step(unix_time: u64, delta: i64) -> Option<u64> {
    let t = unix_time as i64 + delta * PERIOD as i64;
    u64::try_from(t).ok()
}

/// URI用パーセントエンコード（RFC 3986 unreserved 以外をエンコード）
fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// 定数時間の文字列比較
///
/// 一致位置によって比較時間が変わらないよう、全バイトを走査する
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    /// RFC 6238 Appendix B のSHA-1テストシークレット（ASCII "12345678901234567890"）
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    fn create_test_service() -> TotpService {
        let key_base64 = STANDARD.encode([0u8; 32]);
        TotpService::new("TestStore".to_string(), &key_base64).unwrap()
    }

    #[test]
    fn test_generate_secret_length_and_alphabet() {
        let secret = TotpService::generate_secret();
        // 20バイト = Base32で32文字（パディングなし）
        assert_eq!(secret.len(), 32);
        assert!(
            secret
                .chars()
                .all(|c| "ABCDEFGHIJKLMNOPQRSTUVWXYZ234567".contains(c))
        );
    }

    #[test]
    fn test_generate_secret_unique() {
        assert_ne!(TotpService::generate_secret(), TotpService::generate_secret());
    }

    #[test]
    fn test_rfc6238_vector_at_59() {
        let service = create_test_service();
        // RFC 6238: T=59, SHA-1, 8桁で94287082 → 6桁では287082
        assert_eq!(service.generate_at(RFC_SECRET, 59).unwrap(), "287082");
        assert_eq!(service.verify_at(RFC_SECRET, "287082", 0, 59).unwrap(), Some(0));
    }

    #[test]
    fn test_rfc6238_vector_at_1111111109() {
        let service = create_test_service();
        // RFC 6238: T=1111111109, SHA-1, 8桁で07081804 → 6桁では081804
        assert_eq!(
            service.generate_at(RFC_SECRET, 1111111109).unwrap(),
            "081804"
        );
        assert_eq!(
            service.verify_at(RFC_SECRET, "081804", 0, 1111111109).unwrap(),
            Some(0)
        );
    }

    #[test]
    fn test_generate_is_deterministic() {
        let service = create_test_service();
        let first = service.generate_at(RFC_SECRET, 1234567890).unwrap();
        let second = service.generate_at(RFC_SECRET, 1234567890).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 6);
        assert!(first.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_verify_accepts_one_step_drift() {
        let service = create_test_service();
        // T=59で有効なコードは、1ステップ後（T=89）でもwindow=1で受理される
        let result = service.verify_at(RFC_SECRET, "287082", 1, 59 + 30).unwrap();
        assert_eq!(result, Some(-1));
    }

    #[test]
    fn test_verify_rejects_beyond_window() {
        let service = create_test_service();
        // (window + 2) ステップ後では受理されない
        let result = service.verify_at(RFC_SECRET, "287082", 1, 59 + 90).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_verify_window_is_clamped() {
        let service = create_test_service();
        // window=10を指定しても±2で頭打ちになり、5ステップ離れたコードは拒否
        let code = service.generate_at(RFC_SECRET, 59).unwrap();
        let result = service.verify_at(RFC_SECRET, &code, 10, 59 + 150).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_verify_rejects_malformed_codes() {
        let service = create_test_service();
        for code in ["", "12345", "1234567", "12345a", "abcdef", "12 456"] {
            assert_eq!(service.verify_at(RFC_SECRET, code, 1, 59).unwrap(), None);
        }
    }

    #[test]
    fn test_verify_preserves_leading_zeros() {
        let service = create_test_service();
        // T=1111111109のコードは081804（先頭ゼロ）。整数比較だと81804に潰れる
        assert_eq!(
            service.verify_at(RFC_SECRET, "81804", 0, 1111111109).unwrap(),
            None
        );
        assert_eq!(
            service.verify_at(RFC_SECRET, "081804", 0, 1111111109).unwrap(),
            Some(0)
        );
    }

    #[test]
    fn test_provisioning_uri_contains_metadata() {
        let service = create_test_service();
        let secret = TotpService::generate_secret();
        let uri = service.provisioning_uri("admin@example.com", &secret);

        assert!(uri.starts_with("otpauth://totp/TestStore:"));
        assert!(uri.contains(&format!("secret={}", secret)));
        assert!(uri.contains("issuer=TestStore"));
        assert!(uri.contains("algorithm=SHA1"));
        assert!(uri.contains("digits=6"));
        assert!(uri.contains("period=30"));
        // メールの '@' はパーセントエンコードされる
        assert!(uri.contains("admin%40example.com"));
    }

    #[test]
    fn test_provisioning_uri_encodes_reserved_label() {
        let service = create_test_service();
        let secret = TotpService::generate_secret();
        // ':' を含むラベルは拒否せずエンコードする
        let uri = service.provisioning_uri("shop:admin@example.com", &secret);
        assert!(uri.contains("shop%3Aadmin%40example.com"));
    }

    #[test]
    fn test_provisioning_uri_roundtrip() {
        let service = create_test_service();
        let secret = TotpService::generate_secret();
        let uri = service.provisioning_uri("admin@example.com", &secret);

        // URIに埋め込まれたシークレットで検証しても結果が一致する
        let embedded = uri
            .split("secret=")
            .nth(1)
            .and_then(|s| s.split('&').next())
            .unwrap();
        let code = service.generate_at(&secret, 1234567890).unwrap();
        assert_eq!(
            service.verify_at(embedded, &code, 0, 1234567890).unwrap(),
            service.verify_at(&secret, &code, 0, 1234567890).unwrap(),
        );
    }

    #[test]
    fn test_qr_code_base64() {
        let service = create_test_service();
        let secret = TotpService::generate_secret();
        let qr = service.qr_code_base64("admin@example.com", &secret).unwrap();
        assert!(!qr.is_empty());
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let service = create_test_service();
        let original = TotpService::generate_secret();

        let encrypted = service.encrypt_secret(&original).unwrap();
        // 12バイトnonce + 暗号文 + 16バイトtag
        assert!(encrypted.len() > 12);
        // 平文がそのまま含まれていないこと
        assert_ne!(&encrypted[12..], original.as_bytes());

        let decrypted = service.decrypt_secret(&encrypted).unwrap();
        assert_eq!(original, decrypted);
    }

    #[test]
    fn test_decrypt_rejects_truncated_data() {
        let service = create_test_service();
        assert!(service.decrypt_secret(&[0u8; 5]).is_err());
    }

    #[test]
    fn test_new_with_invalid_key_length() {
        let short_key = STANDARD.encode([0u8; 16]);
        assert!(TotpService::new("TestStore".to_string(), &short_key).is_err());
    }

    #[test]
    fn test_new_with_invalid_base64() {
        assert!(TotpService::new("TestStore".to_string(), "not-valid-base64!!!").is_err());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"287082", b"287082"));
        assert!(!constant_time_eq(b"287082", b"287083"));
        assert!(!constant_time_eq(b"287082", b"28708"));
    }
}
