use clap::{ArgAction, ArgGroup, Parser};
use pcap::Activated;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender};
use std::time::Duration;
use threads::{CollectorConfig, CollectorState, CollectorThread, IPCMessage, Report};
use wlan::MacAddr;
use wpa::capture::{CaptureError, FileSource, FrameSource, LiveSource, Result};
use wpa::NetworkInfo;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["pcap", "iface"])))]
pub struct Args {
    /// read frames from a pcap file
    #[arg(short, long)]
    pcap: Option<PathBuf>,

    /// capture frames from a monitor mode interface
    #[arg(short, long)]
    iface: Option<String>,

    /// stop capturing from the interface after this many seconds
    #[arg(short, long, requires = "iface")]
    duration: Option<u64>,

    /// only collect frames of this access point
    #[arg(short, long)]
    bssid: Option<MacAddr>,

    /// print the networks table
    #[arg(long)]
    networks: bool,

    /// print the captured handshakes
    #[arg(long)]
    handshakes: bool,

    /// write the handshakes as hashcat 22000 lines to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// more logging, repeat for more
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// What a run collected
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub frames: usize,
    pub rejected: usize,
    pub networks: usize,
    pub handshakes: usize,
    pub anomalies: usize,
    pub exported: usize,
}

pub fn run() -> Result<()> {
    let args = Args::parse(); //parse arguments
    aux::init_logger(args.verbose);

    let summary = execute(&args)?;
    println!(
        "{} frames, {} networks, {} handshakes, {} anomalies",
        summary.frames, summary.networks, summary.handshakes, summary.anomalies
    );
    if let Some(output) = &args.output {
        println!("{} handshakes written to {}", summary.exported, output.display());
    }
    Ok(())
}

/// Streams the selected source through a collector thread and prints the results.
pub fn execute(args: &Args) -> Result<Summary> {
    let config = CollectorConfig {
        bssid: args.bssid,
        ..Default::default()
    };
    let (tx, rx, handle) = CollectorThread::spawn(config);
    let mut anomalies = 0;

    let streamed = match (&args.pcap, &args.iface) {
        (Some(path), _) => {
            let mut source = FileSource::open(path)?;
            pump(&mut source, &tx, &rx, &mut anomalies)
        }
        (None, Some(iface)) => {
            let mut source = LiveSource::open(iface)?;
            if let Some(secs) = args.duration {
                source = source.with_duration(Duration::from_secs(secs));
            }
            pump(&mut source, &tx, &rx, &mut anomalies)
        }
        (None, None) => Ok(()),
    };

    // stop the collector even if streaming failed
    let _ = tx.send(IPCMessage::EndCommunication);
    let state = handle
        .join()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "collector thread panicked"))?;
    rx.try_iter().for_each(|report| print_report(&report, &mut anomalies));
    streamed?;

    let mut networks: Vec<&NetworkInfo> = state.networks.values().collect();
    networks.sort_by_key(|network| network.bssid);

    let show_all = !args.networks && !args.handshakes;
    if args.networks || show_all {
        print_networks(&networks);
    }
    if args.handshakes || show_all {
        print_handshakes(&networks);
    }
    let exported = match &args.output {
        Some(path) => export(path, &networks)?,
        None => 0,
    };

    Ok(summarize(&state, &networks, anomalies, exported))
}

fn summarize(state: &CollectorState, networks: &[&NetworkInfo], anomalies: usize, exported: usize) -> Summary {
    Summary {
        frames: state.frames,
        rejected: state.rejected,
        networks: networks.len(),
        handshakes: networks.iter().filter(|n| n.handshake.is_some()).count(),
        anomalies,
        exported,
    }
}

// sends every frame of the source to the collector, printing reports as they come
fn pump<T: Activated + ?Sized>(
    source: &mut FrameSource<T>,
    tx: &Sender<IPCMessage>,
    rx: &Receiver<Report>,
    anomalies: &mut usize,
) -> Result<()> {
    loop {
        match source.next_frame() {
            Ok(Some(frame)) => {
                if tx.send(IPCMessage::Frame(frame)).is_err() {
                    log::warn!("collector thread is gone");
                    return Ok(());
                }
            }
            Ok(None) => return Ok(()),
            Err(e @ (CaptureError::Frame(_) | CaptureError::RadiotapVersion(_))) => {
                log::debug!("skipping packet: {e}");
            }
            Err(e) => return Err(e),
        }
        rx.try_iter().for_each(|report| print_report(&report, anomalies));
    }
}

fn print_report(report: &Report, anomalies: &mut usize) {
    match report {
        Report::Network(network) => println!("[+] network {} {}", network.bssid, network.ssid_lossy()),
        Report::Handshake(handshake) => {
            println!("[+] handshake {} <-> {}", handshake.ap_mac, handshake.station_mac)
        }
        Report::Anomaly { key, error } => {
            *anomalies += 1;
            log::warn!("{key}: {error}");
        }
        Report::Rejected(error) => log::debug!("rejected frame: {error}"),
    }
}

fn print_networks(networks: &[&NetworkInfo]) {
    println!(
        "\n{:<32} | {:>3} | {:<8} | {:<17} | {:>5} |",
        "SSID", "CH", "SECURITY", "BSSID", "BEACONS"
    );
    for network in networks {
        println!("{}", network);
    }
}

fn print_handshakes(networks: &[&NetworkInfo]) {
    for handshake in networks.iter().filter_map(|n| n.handshake.as_ref()) {
        println!("\n{}", handshake);
    }
}

/// Writes one hashcat 22000 line per handshake whose ESSID is known.
fn export(path: &Path, networks: &[&NetworkInfo]) -> Result<usize> {
    let mut writer = BufWriter::new(File::create(path)?);
    let mut exported = 0;
    for network in networks {
        let Some(handshake) = &network.handshake else { continue };
        match handshake.hc22000() {
            Some(line) => {
                writeln!(writer, "{}", line)?;
                exported += 1;
            }
            None => log::warn!("no ESSID for {}, handshake not exported", network.bssid),
        }
    }
    writer.flush()?;
    Ok(exported)
}
