//! Threshold BLS party CLI
//!
//! Command-line interface for:
//! - Distributed Key Generation (DKG), simulated locally for `n` participants
//! - Signature share generation
//! - Signature share merging
//! - Signature verification

use anyhow::{anyhow, bail, ensure, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tbls_core::keygen::{CommitmentMessage, ContributionMessage, DkgOutput, DkgSession};
use tbls_core::{
    ParticipantIndex, PrivateKeyShare, PublicKey, PublicKeyShare, SigShare, SigShareSet,
    Signature, ThresholdParams,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Threshold BLS party
#[derive(Parser)]
#[command(name = "tbls-party")]
#[command(about = "Threshold BLS key generation, signing and signature recovery")]
#[command(version)]
struct Cli {
    /// Directory for key, share and signature files
    #[arg(short, long, env = "TBLS_DEST", default_value = "./data", global = true)]
    dest: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run distributed key generation for all participants
    Keygen {
        /// Threshold (t-of-n)
        #[arg(short, long)]
        t: usize,

        /// Number of participants
        #[arg(short, long)]
        n: usize,

        /// Check every contribution against its sender's commitments
        #[arg(long)]
        verify: bool,

        /// Print the generated files
        #[arg(short, long)]
        verbose: bool,
    },

    /// Produce a signature share with one participant's secret key
    Sign {
        /// Signer index (1-based)
        #[arg(short, long)]
        index: ParticipantIndex,

        #[command(flatten)]
        message: MessageArgs,
    },

    /// Recover the group signature from signature shares
    Merge {
        /// Threshold (t-of-n)
        #[arg(short, long)]
        t: usize,

        /// Number of participants
        #[arg(short, long)]
        n: usize,

        #[command(flatten)]
        message: MessageArgs,

        /// Signer indices whose shares to merge (comma-separated)
        #[arg(short, long)]
        shares: String,
    },

    /// Verify a signature against the common public key
    Verify {
        #[command(flatten)]
        message: MessageArgs,

        /// Signature file, defaults to signature.json in the data directory
        #[arg(long)]
        signature_file: Option<PathBuf>,
    },
}

#[derive(Args)]
struct MessageArgs {
    /// Message to sign or verify
    #[arg(short, long)]
    message: String,

    /// Treat the message as hex instead of UTF-8 text
    #[arg(long)]
    hex: bool,
}

impl MessageArgs {
    fn bytes(&self) -> Result<Vec<u8>> {
        parse_message(&self.message, self.hex)
    }
}

/// `secret_key<j>.json`
#[derive(Serialize, Deserialize)]
struct SecretKeyFile {
    secret_key: String,
    index: ParticipantIndex,
    t: usize,
    n: usize,
}

#[derive(Serialize, Deserialize)]
struct Fq2Coords {
    c0: String,
    c1: String,
}

#[derive(Serialize, Deserialize)]
struct G2Coords {
    #[serde(rename = "X")]
    x: Fq2Coords,
    #[serde(rename = "Y")]
    y: Fq2Coords,
}

/// `public_key.json`
#[derive(Serialize, Deserialize)]
struct PublicKeyFile {
    public_key: G2Coords,
    t: usize,
    n: usize,
}

impl PublicKeyFile {
    fn new(public_key: &PublicKey) -> Self {
        let [x_c0, x_c1, y_c0, y_c1] = public_key.to_strings();
        let params = public_key.params();
        Self {
            public_key: G2Coords {
                x: Fq2Coords { c0: x_c0, c1: x_c1 },
                y: Fq2Coords { c0: y_c0, c1: y_c1 },
            },
            t: params.required(),
            n: params.total(),
        }
    }

    fn into_public_key(self) -> Result<PublicKey> {
        let params = ThresholdParams::new(self.t, self.n)?;
        let G2Coords { x, y } = self.public_key;
        Ok(PublicKey::from_strings(&[x.c0, x.c1, y.c0, y.c1], params)?)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    std::fs::create_dir_all(&cli.dest)
        .with_context(|| format!("creating {}", cli.dest.display()))?;
    tbls_core::init();

    match &cli.command {
        Commands::Keygen {
            t,
            n,
            verify,
            verbose,
        } => run_keygen(&cli.dest, *t, *n, *verify, *verbose),
        Commands::Sign { index, message } => run_sign(&cli.dest, *index, &message.bytes()?),
        Commands::Merge {
            t,
            n,
            message,
            shares,
        } => run_merge(&cli.dest, *t, *n, &message.bytes()?, shares),
        Commands::Verify {
            message,
            signature_file,
        } => {
            let path = signature_file
                .clone()
                .unwrap_or_else(|| cli.dest.join("signature.json"));
            run_verify(&cli.dest, &message.bytes()?, &path)
        }
    }
}

/// UTF-8 text, or hex with an optional `0x` prefix
fn parse_message(message: &str, is_hex: bool) -> Result<Vec<u8>> {
    if !is_hex {
        return Ok(message.as_bytes().to_vec());
    }
    let digits = message.strip_prefix("0x").unwrap_or(message);
    hex::decode(digits).context("message is not valid hex")
}

/// Parse a comma-separated list of signer indices
fn parse_indices(list: &str) -> Result<Vec<ParticipantIndex>> {
    let indices = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<ParticipantIndex>()
                .with_context(|| format!("invalid signer index {:?}", s))
        })
        .collect::<Result<Vec<_>>>()?;
    ensure!(!indices.is_empty(), "no signer indices given");
    Ok(indices)
}

fn file_suffix(index: ParticipantIndex) -> Result<usize> {
    index
        .checked_sub(1)
        .ok_or_else(|| anyhow!("participant indices start at 1"))
}

fn write_json<T: Serialize>(path: &Path, value: &T, verbose: bool) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, &json).with_context(|| format!("writing {}", path.display()))?;
    if verbose {
        println!("{}:\n{}", path.display(), json);
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
}

/// Apply `f` to every participant, in parallel when enabled
#[cfg(feature = "parallel")]
fn map_parties<T, U, F>(items: Vec<T>, f: F) -> Result<Vec<U>>
where
    T: Send,
    U: Send,
    F: Fn(T) -> Result<U> + Sync + Send,
{
    items.into_par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
fn map_parties<T, U, F>(items: Vec<T>, f: F) -> Result<Vec<U>>
where
    F: Fn(T) -> Result<U>,
{
    items.into_iter().map(f).collect()
}

fn run_keygen(dest: &Path, t: usize, n: usize, verify: bool, verbose: bool) -> Result<()> {
    let params = ThresholdParams::new(t, n)?;
    info!(threshold = t, n_parties = n, verify, "Starting DKG");

    let sessions = map_parties(params.indices().collect(), |index| {
        Ok(DkgSession::new(params, index)?)
    })?;

    let commitments: Vec<CommitmentMessage> =
        sessions.iter().map(DkgSession::commitment_message).collect();
    let mut contributions: Vec<ContributionMessage> = Vec::with_capacity(n * n);
    for session in &sessions {
        contributions.extend(session.contribution_messages()?);
    }

    let outputs: Vec<DkgOutput> = map_parties(sessions, |mut session| {
        for message in &commitments {
            session.receive_commitment(message.clone())?;
        }
        let index = session.index();
        for message in contributions.iter().filter(|m| m.to == index) {
            session.receive_contribution(message.clone())?;
        }
        Ok(session.finish(verify)?)
    })?;
    drop(contributions);

    let public_key = &outputs[0].public_key;
    ensure!(
        outputs.iter().all(|o| &o.public_key == public_key),
        "participants disagree on the common public key"
    );

    for output in &outputs {
        let share = &output.key_share;
        let j = file_suffix(share.index())?;
        let secret = SecretKeyFile {
            secret_key: share.to_decimal()?,
            index: share.index(),
            t,
            n,
        };
        write_json(&dest.join(format!("secret_key{}.json", j)), &secret, verbose)?;
        write_json(
            &dest.join(format!("public_key_share{}.json", j)),
            &share.public_key_share(),
            verbose,
        )?;
    }
    write_json(
        &dest.join("public_key.json"),
        &PublicKeyFile::new(public_key),
        verbose,
    )?;

    info!(public_key = %public_key.to_hex()?, path = ?dest, "DKG completed, keys saved");
    println!("Public Key: {}", public_key.to_hex()?);

    Ok(())
}

fn load_key_share(dest: &Path, index: ParticipantIndex) -> Result<PrivateKeyShare> {
    let path = dest.join(format!("secret_key{}.json", file_suffix(index)?));
    let file: SecretKeyFile = read_json(&path)?;
    ensure!(
        file.index == index,
        "{} belongs to participant {}, not {}",
        path.display(),
        file.index,
        index
    );
    let params = ThresholdParams::new(file.t, file.n)?;
    Ok(PrivateKeyShare::from_decimal(&file.secret_key, index, params)?)
}

fn load_public_key(dest: &Path) -> Result<PublicKey> {
    read_json::<PublicKeyFile>(&dest.join("public_key.json"))?.into_public_key()
}

fn run_sign(dest: &Path, index: ParticipantIndex, message: &[u8]) -> Result<()> {
    let key_share = load_key_share(dest, index)?;
    info!(index, "Signing message");

    let sig_share = key_share.sign(message)?;
    let path = dest.join(format!("sig_share{}.json", file_suffix(index)?));
    write_json(&path, &sig_share, false)?;

    info!(path = ?path, "Signature share saved");
    println!("Signature Share: {}", sig_share);

    Ok(())
}

fn run_merge(dest: &Path, t: usize, n: usize, message: &[u8], shares: &str) -> Result<()> {
    let params = ThresholdParams::new(t, n)?;
    let indices = parse_indices(shares)?;
    info!(signers = ?indices, "Merging signature shares");

    let mut set = SigShareSet::new(params);
    for index in indices {
        let j = file_suffix(index)?;
        let share: SigShare = read_json(&dest.join(format!("sig_share{}.json", j)))?;
        let public_share_path = dest.join(format!("public_key_share{}.json", j));
        if public_share_path.exists() {
            let public_share: PublicKeyShare = read_json(&public_share_path)?;
            if !public_share.verify_share(message, &share)? {
                warn!(index, "Skipping signature share that does not verify");
                continue;
            }
        }
        set.add_sig_share(share)?;
    }

    if !set.is_enough() {
        bail!(
            "need {} valid signature shares, have {}",
            params.required(),
            set.total_sig_shares_count()
        );
    }
    let signature = set.merge()?;

    let path = dest.join("signature.json");
    write_json(&path, &signature, false)?;
    info!(path = ?path, "Signature saved");
    println!("Signature: {}", signature.to_hex()?);

    Ok(())
}

fn run_verify(dest: &Path, message: &[u8], signature_path: &Path) -> Result<()> {
    let public_key = load_public_key(dest)?;
    let signature: Signature = read_json(signature_path)?;

    if !public_key.verify_sig(message, &signature)? {
        bail!("signature is not valid for this message");
    }
    println!("Signature is valid");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message() {
        assert_eq!(parse_message("hello", false).unwrap(), b"hello".to_vec());
        assert_eq!(parse_message("0xdeadbeef", true).unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(parse_message("00ff", true).unwrap(), vec![0x00, 0xff]);
        // text mode keeps the prefix
        assert_eq!(parse_message("0x00", false).unwrap(), b"0x00".to_vec());
        assert!(parse_message("xyz", true).is_err());
        assert!(parse_message("abc", true).is_err());
    }

    #[test]
    fn test_parse_indices() {
        assert_eq!(parse_indices("1,2,3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_indices(" 4 , 2,").unwrap(), vec![4, 2]);
        assert!(parse_indices("").is_err());
        assert!(parse_indices("1,two").is_err());
        assert!(parse_indices("-1").is_err());
    }

    #[test]
    fn test_file_suffix() {
        assert_eq!(file_suffix(1).unwrap(), 0);
        assert_eq!(file_suffix(5).unwrap(), 4);
        assert!(file_suffix(0).is_err());
    }

    #[test]
    fn test_public_key_file_round_trip() {
        let params = ThresholdParams::new(1, 1).unwrap();
        let key = tbls_core::PrivateKey::from_decimal("987654321", params).unwrap();
        let public_key = key.public_key();

        let json = serde_json::to_value(PublicKeyFile::new(&public_key)).unwrap();
        assert!(json["public_key"]["X"]["c0"].is_string());
        assert!(json["public_key"]["Y"]["c1"].is_string());
        assert_eq!(json["t"], 1);

        let file: PublicKeyFile = serde_json::from_value(json).unwrap();
        assert_eq!(file.into_public_key().unwrap(), public_key);
    }

    #[test]
    fn test_keygen_sign_merge_verify() {
        let dest = std::env::temp_dir().join(format!("tbls-party-flow-{}", std::process::id()));
        std::fs::create_dir_all(&dest).unwrap();
        let message = b"file based flow";

        run_keygen(&dest, 3, 5, true, false).unwrap();
        for index in [1, 3, 5] {
            run_sign(&dest, index, message).unwrap();
        }

        assert!(run_merge(&dest, 3, 5, message, "1,3").is_err());
        run_merge(&dest, 3, 5, message, "1,3,5").unwrap();
        run_verify(&dest, message, &dest.join("signature.json")).unwrap();
        assert!(run_verify(&dest, b"other message", &dest.join("signature.json")).is_err());

        std::fs::remove_dir_all(&dest).unwrap();
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "tbls-party", "merge", "-t", "2", "-n", "3", "-m", "hi", "-s", "1,3",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Merge { t: 2, n: 3, .. }));
    }
}
