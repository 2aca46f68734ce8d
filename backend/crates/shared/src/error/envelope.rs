//! Error Envelope - the client-facing failure shape
//!
//! Every failure leaves the server as `{ "success": false, "message": "..." }`.

use std::borrow::Cow;

use serde::Serialize;

/// 本番モードでクライアントに返す固定メッセージ
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong.";

/// クライアント向けエラーエンベロープ
///
/// `success` は常に `false` です。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub message: Cow<'static, str>,
}

impl ErrorEnvelope {
    /// 失敗メッセージをそのまま載せたエンベロープ（開発モード）
    pub fn detailed(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// 汎用メッセージのエンベロープ（本番モード）
    pub fn generic() -> Self {
        Self::detailed(GENERIC_FAILURE_MESSAGE)
    }

    /// モードに応じてメッセージを選択
    pub fn for_mode(expose_detail: bool, message: impl Into<Cow<'static, str>>) -> Self {
        if expose_detail {
            Self::detailed(message)
        } else {
            Self::generic()
        }
    }
}

/// 失敗レスポンスに添付されるレポート
///
/// `AppError` のレスポンス拡張として運ばれ、フォールトバウンダリが
/// ログ出力とエンベロープ再構築に使用します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    /// 宣言されたステータスコード
    pub status: u16,
    /// クライアント向けメッセージ
    pub message: String,
    /// ソースチェーンを含む完全な詳細（ログ専用）
    pub detail: String,
}
