use clap::{Arg, ArgMatches, Command};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use libdetchannelmaps::channel_map::TpcChannelMap;
use libdetchannelmaps::config::Config;
use libdetchannelmaps::hardware_map::{parse_geo_id, HardwareMapService};

fn make_template_config(path: &Path) {
    let config = Config::default();
    let yaml_str = serde_yaml::to_string(&config).unwrap();
    let mut file = File::create(path).expect("Could create template config file!");
    file.write_all(yaml_str.as_bytes())
        .expect("Failed to write yaml data to file!");
}

/// Parse a geo-id argument, accepting decimal or 0x-prefixed hex
fn parse_geo_id_arg(raw: &str) -> Result<u64, std::num::ParseIntError> {
    if let Some(hex) = raw.strip_prefix("0x") {
        u64::from_str_radix(hex, 16)
    } else {
        raw.parse()
    }
}

fn run_dump(service: &HardwareMapService) {
    match service.get_hardware_map_json() {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("{e}"),
    }
}

fn run_dro(service: &HardwareMapService, sub_matches: &ArgMatches) {
    let host = sub_matches.get_one::<String>("host").expect("We require args");
    let card: u16 = match sub_matches
        .get_one::<String>("card")
        .expect("We require args")
        .parse()
    {
        Ok(c) => c,
        Err(e) => {
            log::error!("Invalid card number: {e}");
            return;
        }
    };

    match service.get_dro_info(host, card) {
        Ok(dro) => {
            log::info!("DRO {}/{} has {} links:", dro.host, dro.card, dro.links.len());
            for hw in &dro.links {
                log::info!(
                    "  source id {} -> link {} slot {} crate {} id {} (slr {} link {})",
                    hw.dro_source_id,
                    hw.det_link,
                    hw.det_slot,
                    hw.det_crate,
                    hw.det_id,
                    hw.dro_slr,
                    hw.dro_link
                );
            }
        }
        Err(e) => log::error!("{e}"),
    }
}

fn run_geo_id(sub_matches: &ArgMatches) {
    let raw = sub_matches.get_one::<String>("id").expect("We require args");
    let geo_id = match parse_geo_id_arg(raw) {
        Ok(id) => id,
        Err(e) => {
            log::error!("Invalid geo-id: {e}");
            return;
        }
    };
    let info = parse_geo_id(geo_id);
    log::info!(
        "geo-id {:#018x}: link {} slot {} crate {} id {}",
        geo_id,
        info.det_link,
        info.det_slot,
        info.det_crate,
        info.det_id
    );
}

fn run_offline(config: &Config, sub_matches: &ArgMatches) {
    let mut coords = [0u32; 4];
    for (value, name) in coords.iter_mut().zip(["crate", "slot", "fiber", "chan"]) {
        *value = match sub_matches
            .get_one::<String>(name)
            .expect("We require args")
            .parse()
        {
            Ok(v) => v,
            Err(e) => {
                log::error!("Invalid {name}: {e}");
                return;
            }
        };
    }

    let map = match TpcChannelMap::from_config_root(&config.channel_map_root) {
        Ok(m) => m,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };

    match map.get_offline_channel_from_crate_slot_fiber_chan(
        coords[0], coords[1], coords[2], coords[3],
    ) {
        Some(offline) => log::info!(
            "crate {} slot {} fiber {} chan {} -> offline channel {} (plane {})",
            coords[0],
            coords[1],
            coords[2],
            coords[3],
            offline,
            map.get_plane_from_offline_channel(offline)
        ),
        None => log::warn!(
            "crate {} slot {} fiber {} chan {} is not a valid channel",
            coords[0],
            coords[1],
            coords[2],
            coords[3]
        ),
    }
}

fn build_cli() -> Command {
    Command::new("detchannelmaps_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .subcommand(Command::new("dump").about("Print the hardware map as JSON"))
        .subcommand(
            Command::new("dro")
                .about("Look up a DRO unit by host and card")
                .arg(Arg::new("host").long("host").required(true))
                .arg(Arg::new("card").long("card").required(true)),
        )
        .subcommand(
            Command::new("geo-id")
                .about("Unpack a geo-id into detector coordinates")
                .arg(Arg::new("id").long("id").required(true)),
        )
        .subcommand(
            Command::new("offline")
                .about("Look up the offline channel for a crate/slot/fiber/chan tuple")
                .arg(Arg::new("crate").long("crate").required(true))
                .arg(Arg::new("slot").long("slot").required(true))
                .arg(Arg::new("fiber").long("fiber").required(true))
                .arg(Arg::new("chan").long("chan").required(true)),
        )
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .help("Path to the configuration file"),
        )
}

/// Configuration file path from the cli, if one was given
fn get_config_path(matches: &ArgMatches) -> Option<PathBuf> {
    matches.get_one::<String>("path").map(PathBuf::from)
}

fn main() {
    // Create a cli
    let matches = build_cli().get_matches();

    // Initialize feedback
    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
    .expect("Could not create logging!");

    if let Some(("geo-id", sub_matches)) = matches.subcommand() {
        // Pure bit unpacking, no config needed
        run_geo_id(sub_matches);
        return;
    }

    // Parse the cli
    let config_path = match get_config_path(&matches) {
        Some(p) => p,
        None => {
            log::error!("No configuration file given; pass one with -p/--path");
            return;
        }
    };

    if let Some(("new", _)) = matches.subcommand() {
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );

        make_template_config(&config_path);
        log::info!("Done.");
        return;
    }

    // Load our config
    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    log::info!("Config successfully loaded.");
    log::info!(
        "Hardware Map Path: {}",
        config.hardware_map_path.to_string_lossy()
    );
    log::info!(
        "Channel Map Root: {}",
        config.channel_map_root.to_string_lossy()
    );

    match matches.subcommand() {
        Some(("offline", sub_matches)) => {
            run_offline(&config, sub_matches);
            return;
        }
        _ => (),
    }

    let service = match HardwareMapService::new(&config.hardware_map_path) {
        Ok(s) => s,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };

    match matches.subcommand() {
        Some(("dump", _)) => run_dump(&service),
        Some(("dro", sub_matches)) => run_dro(&service, sub_matches),
        _ => (),
    }

    log::info!("Done.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_path_is_reported_not_a_panic() {
        // A subcommand without -p must still parse; the missing path comes
        // back as None and is handled with an error message
        let matches = build_cli()
            .try_get_matches_from(["detchannelmaps_cli", "dump"])
            .expect("dump without -p must parse");
        assert!(get_config_path(&matches).is_none());
    }

    #[test]
    fn test_config_path_is_picked_up() {
        let matches = build_cli()
            .try_get_matches_from(["detchannelmaps_cli", "-p", "config.yaml", "dump"])
            .expect("dump with -p must parse");
        assert_eq!(
            get_config_path(&matches),
            Some(PathBuf::from("config.yaml"))
        );
    }
}
