//! Signers that attest a single artifact

use crate::key::SigningKey;
use async_trait::async_trait;
use minisign::{SecretKeyBox, SignatureBox};
use relbuild_errors::{ConfigError, Error, SigningError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;

/// Digest recorded alongside a signature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

impl DigestAlgorithm {
    #[must_use]
    pub fn hex_digest(self, data: &[u8]) -> String {
        match self {
            Self::Sha256 => hex::encode(Sha256::digest(data)),
            Self::Sha512 => hex::encode(Sha512::digest(data)),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Sha512 => write!(f, "sha512"),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(ConfigError::InvalidValue {
                field: "signing.digest".to_string(),
                value: s.to_string(),
            }
            .into()),
        }
    }
}

/// Applies and detects signatures on one artifact
#[async_trait]
pub trait ArtifactSigner: Send + Sync {
    /// Whether `artifact` already carries a valid signature for `key`
    async fn is_signed(&self, artifact: &Path, key: &SigningKey) -> Result<bool, Error>;

    /// Sign `artifact` with `key`
    async fn sign(
        &self,
        artifact: &Path,
        key: &SigningKey,
        digest: DigestAlgorithm,
    ) -> Result<(), Error>;
}

/// Sidecar signature path: the artifact name with `suffix` appended
#[must_use]
pub fn signature_path(artifact: &Path, suffix: &str) -> PathBuf {
    let mut name = artifact.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn signing_failed(artifact: &Path, message: impl Into<String>) -> Error {
    SigningError::SigningFailed {
        artifact: artifact.display().to_string(),
        message: message.into(),
    }
    .into()
}

/// In-process minisign signatures written as sidecar files
#[derive(Debug, Clone)]
pub struct MinisignSigner {
    suffix: String,
    password: Option<String>,
}

impl MinisignSigner {
    #[must_use]
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            password: None,
        }
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

#[async_trait]
impl ArtifactSigner for MinisignSigner {
    async fn is_signed(&self, artifact: &Path, key: &SigningKey) -> Result<bool, Error> {
        let sig_path = signature_path(artifact, &self.suffix);
        let Ok(sig_text) = fs::read_to_string(&sig_path).await else {
            return Ok(false);
        };

        let pk_text = fs::read_to_string(&key.public_key)
            .await
            .map_err(|e| Error::io_with_path(&e, &key.public_key))?;
        let public_key = minisign_verify::PublicKey::decode(&pk_text).map_err(|e| {
            SigningError::InvalidKey {
                path: key.public_key.display().to_string(),
                message: e.to_string(),
            }
        })?;

        let Ok(signature) = minisign_verify::Signature::decode(&sig_text) else {
            return Ok(false);
        };
        let content = fs::read(artifact)
            .await
            .map_err(|e| Error::io_with_path(&e, artifact))?;

        Ok(public_key.verify(&content, &signature, false).is_ok())
    }

    async fn sign(
        &self,
        artifact: &Path,
        key: &SigningKey,
        digest: DigestAlgorithm,
    ) -> Result<(), Error> {
        let sk_text = fs::read_to_string(&key.secret_key)
            .await
            .map_err(|e| Error::io_with_path(&e, &key.secret_key))?;
        let secret_key = SecretKeyBox::from_string(&sk_text)
            .and_then(|sk_box| sk_box.into_secret_key(self.password.clone()))
            .map_err(|e| SigningError::InvalidKey {
                path: key.secret_key.display().to_string(),
                message: e.to_string(),
            })?;

        let content = fs::read(artifact)
            .await
            .map_err(|e| Error::io_with_path(&e, artifact))?;
        let file_name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let trusted_comment = format!(
            "file:{file_name} {digest}:{}",
            digest.hex_digest(&content)
        );
        let untrusted_comment = format!("signature from relbuild for {file_name}");

        let signature: SignatureBox = minisign::sign(
            None,
            &secret_key,
            Cursor::new(&content),
            Some(&trusted_comment),
            Some(&untrusted_comment),
        )
        .map_err(|e| signing_failed(artifact, e.to_string()))?;

        let sig_path = signature_path(artifact, &self.suffix);
        fs::write(&sig_path, signature.into_string())
            .await
            .map_err(|e| signing_failed(artifact, format!("cannot write signature: {e}")))?;
        Ok(())
    }
}

/// Delegates signing to an external tool
///
/// Arguments may contain `{artifact}`, `{key_dir}`, `{secret_key}` and
/// `{digest}`, which are substituted per artifact. The tool runs in the
/// artifact's directory.
#[derive(Debug, Clone)]
pub struct CommandSigner {
    command: Vec<String>,
    check: Vec<String>,
    suffix: String,
}

impl CommandSigner {
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `command` is empty.
    pub fn new(command: Vec<String>, suffix: impl Into<String>) -> Result<Self, Error> {
        if command.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "signing.command".to_string(),
                value: "[]".to_string(),
            }
            .into());
        }
        Ok(Self {
            command,
            check: Vec::new(),
            suffix: suffix.into(),
        })
    }

    /// Command whose zero exit status means the artifact is already signed
    ///
    /// Without one, an existing sidecar file counts as a signature.
    #[must_use]
    pub fn with_check(mut self, check: Vec<String>) -> Self {
        self.check = check;
        self
    }

    fn render(
        template: &[String],
        artifact: &Path,
        key: &SigningKey,
        digest: DigestAlgorithm,
    ) -> Vec<String> {
        template
            .iter()
            .map(|arg| {
                arg.replace("{artifact}", &artifact.display().to_string())
                    .replace("{key_dir}", &key.dir.display().to_string())
                    .replace("{secret_key}", &key.secret_key.display().to_string())
                    .replace("{digest}", &digest.to_string())
            })
            .collect()
    }

    async fn run(args: &[String], artifact: &Path) -> Result<std::process::Output, Error> {
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| signing_failed(artifact, "empty command"))?;
        let workdir = artifact.parent().unwrap_or_else(|| Path::new("."));
        tokio::process::Command::new(program)
            .args(rest)
            .current_dir(workdir)
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| signing_failed(artifact, format!("cannot run {program}: {e}")))
    }
}

#[async_trait]
impl ArtifactSigner for CommandSigner {
    async fn is_signed(&self, artifact: &Path, key: &SigningKey) -> Result<bool, Error> {
        if self.check.is_empty() {
            return Ok(fs::try_exists(signature_path(artifact, &self.suffix))
                .await
                .unwrap_or(false));
        }
        let args = Self::render(&self.check, artifact, key, DigestAlgorithm::default());
        let output = Self::run(&args, artifact).await?;
        Ok(output.status.success())
    }

    async fn sign(
        &self,
        artifact: &Path,
        key: &SigningKey,
        digest: DigestAlgorithm,
    ) -> Result<(), Error> {
        let args = Self::render(&self.command, artifact, key, digest);
        let output = Self::run(&args, artifact).await?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(signing_failed(
                artifact,
                format!("{} ({})", stderr.trim(), output.status),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minisign::KeyPair;
    use tempfile::tempdir;

    fn write_keys(dir: &Path) -> SigningKey {
        let KeyPair { pk, sk } = KeyPair::generate_unencrypted_keypair().unwrap();
        std::fs::write(dir.join("test.key"), sk.to_box(None).unwrap().to_string()).unwrap();
        std::fs::write(dir.join("test.pub"), pk.to_box().unwrap().to_string()).unwrap();
        SigningKey::load(dir).unwrap()
    }

    #[test]
    fn digest_names_parse() {
        assert_eq!("SHA256".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Sha256);
        assert_eq!("sha512".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Sha512);
        assert!("md5".parse::<DigestAlgorithm>().is_err());
        assert_eq!(DigestAlgorithm::Sha256.hex_digest(b"").len(), 64);
    }

    #[test]
    fn sidecar_path_appends_suffix() {
        assert_eq!(
            signature_path(Path::new("/d/foo-1.0-1.noarch.rpm"), ".minisig"),
            PathBuf::from("/d/foo-1.0-1.noarch.rpm.minisig")
        );
    }

    #[tokio::test]
    async fn minisign_round_trip() {
        let keys = tempdir().unwrap();
        let key = write_keys(keys.path());
        let work = tempdir().unwrap();
        let artifact = work.path().join("foo-1.0.0-1.noarch.rpm");
        std::fs::write(&artifact, b"payload").unwrap();

        let signer = MinisignSigner::new(".minisig");
        assert!(!signer.is_signed(&artifact, &key).await.unwrap());
        signer
            .sign(&artifact, &key, DigestAlgorithm::Sha256)
            .await
            .unwrap();
        assert!(signer.is_signed(&artifact, &key).await.unwrap());

        std::fs::write(&artifact, b"tampered").unwrap();
        assert!(!signer.is_signed(&artifact, &key).await.unwrap());
    }

    #[tokio::test]
    async fn command_signer_reports_tool_failure() {
        let keys = tempdir().unwrap();
        std::fs::write(keys.path().join("k.key"), "").unwrap();
        std::fs::write(keys.path().join("k.pub"), "").unwrap();
        let key = SigningKey::load(keys.path()).unwrap();
        let work = tempdir().unwrap();
        let artifact = work.path().join("a.rpm");
        std::fs::write(&artifact, b"x").unwrap();

        let ok = CommandSigner::new(vec!["true".into()], ".sig").unwrap();
        assert!(ok.sign(&artifact, &key, DigestAlgorithm::Sha256).await.is_ok());

        let failing = CommandSigner::new(vec!["false".into()], ".sig").unwrap();
        assert!(failing
            .sign(&artifact, &key, DigestAlgorithm::Sha256)
            .await
            .is_err());

        assert!(CommandSigner::new(Vec::new(), ".sig").is_err());
    }
}
