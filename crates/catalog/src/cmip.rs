//! CMIP naming conventions: MIPs, default tables and modelling centres.

use crate::error::CatalogError;

/// Name of the pre-industrial control experiment.
pub const CONTROL_EXPERIMENT: &str = "piControl";

/// MIP that defines `experiment`.
///
/// # Errors
///
/// Returns [`CatalogError::UnknownExperiment`] for experiments outside
/// ScenarioMIP, CMIP and RFMIP.
pub fn mip_for_experiment(experiment: &str) -> Result<&'static str, CatalogError> {
    if experiment.starts_with("ssp") {
        return Ok("ScenarioMIP");
    }
    match experiment {
        "piClim-ghg" => Ok("RFMIP"),
        "historical" | "piControl" | "1pctCO2" => Ok("CMIP"),
        _ => Err(CatalogError::UnknownExperiment {
            experiment: experiment.to_string(),
        }),
    }
}

/// Monthly table a variable is usually published in.
pub fn table_for_variable(variable: &str) -> &'static str {
    match variable {
        "mrso" | "mrro" | "mrsos" => "Lmon",
        "snw" | "snc" => "LImon",
        "sos" | "tos" => "Omon",
        "pr_day" => "day",
        _ => "Amon",
    }
}

/// Institution publishing `model` for `mip`, when known.
///
/// A `project/model` prefix is ignored. MPI-ESM1-2-HR is published by DKRZ
/// for ScenarioMIP and by MPI-M for CMIP.
pub fn institute_for_model(model: &str, mip: &str) -> Option<&'static str> {
    let model = model.split_once('/').map_or(model, |(_, m)| m);
    if model == "MPI-ESM1-2-HR" {
        return match mip {
            "ScenarioMIP" => Some("DKRZ"),
            "CMIP" | "DCPP" => Some("MPI-M"),
            _ => None,
        };
    }
    let institute = match model {
        "ACCESS-CM2" => "CSIRO-ARCCSS",
        "ACCESS-ESM1-5" => "CSIRO",
        "AWI-CM-1-1-MR" | "AWI-ESM-1-1-LR" => "AWI",
        "BCC-CSM2-HR" | "BCC-CSM2-MR" | "BCC-ESM1" => "BCC",
        "CAMS-CSM1-0" => "CAMS",
        "CAS-ESM2-0" | "FGOALS-f3-L" | "FGOALS-g3" => "CAS",
        "CESM2" | "CESM2-FV2" | "CESM2-WACCM" | "CESM2-WACCM-FV2" => "NCAR",
        "CIESM" => "THU",
        "CNRM-CM6-1" | "CNRM-CM6-1-HR" | "CNRM-ESM2-1" => "CNRM-CERFACS",
        "CanESM5" | "CanESM5-CanOE" => "CCCma",
        "CMCC-ESM2" | "CMCC-CM2-SR5" | "CMCC-CM2-HR4" => "CMCC",
        "E3SM-1-0" | "E3SM-1-1" | "E3SM-1-1-ECA" => "E3SM-Project",
        "EC-Earth3" | "EC-Earth3-CC" | "EC-Earth3-Veg" | "EC-Earth3-Veg-LR"
        | "EC-Earth3-AerChem" => "EC-Earth-Consortium",
        "FIO-ESM-2-0" => "FIO-QLNM",
        "GFDL-CM4" | "GFDL-ESM4" => "NOAA-GFDL",
        "GISS-E2-1-G" | "GISS-E2-1-G-CC" | "GISS-E2-1-H" | "GISS-E2-2-G" => "NASA-GISS",
        "HadGEM3-GC31-LL" | "HadGEM3-GC31-MM" | "UKESM1-0-LL" => "MOHC",
        "IITM-ESM" => "CCCR-IITM",
        "INM-CM4-8" | "INM-CM5-0" => "INM",
        "IPSL-CM6A-LR" | "IPSL-CM5A2-INCA" => "IPSL",
        "KACE-1-0-G" => "NIMS-KMA",
        "MCM-UA-1-0" => "UA",
        "MIROC-ES2L" | "MIROC6" => "MIROC",
        "MPI-ESM-1-2-HAM" => "HAMMOZ-Consortium",
        "MPI-ESM1-2-LR" => "MPI-M",
        "MRI-ESM2-0" => "MRI",
        "NESM3" => "NUIST",
        "NorCPM1" | "NorESM2-LM" | "NorESM2-MM" => "NCC",
        "SAM0-UNICON" => "SNU",
        "TaiESM1" => "AS-RCEC",
        _ => return None,
    };
    Some(institute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mips() {
        assert_eq!(mip_for_experiment("ssp245").unwrap(), "ScenarioMIP");
        assert_eq!(mip_for_experiment("historical").unwrap(), "CMIP");
        assert_eq!(mip_for_experiment("piControl").unwrap(), "CMIP");
        assert_eq!(mip_for_experiment("piClim-ghg").unwrap(), "RFMIP");
        assert!(mip_for_experiment("amip").is_err());
    }

    #[test]
    fn tables() {
        assert_eq!(table_for_variable("pr"), "Amon");
        assert_eq!(table_for_variable("mrso"), "Lmon");
        assert_eq!(table_for_variable("snc"), "LImon");
        assert_eq!(table_for_variable("tos"), "Omon");
    }

    #[test]
    fn institutes() {
        assert_eq!(institute_for_model("CNRM-CM6-1", "CMIP"), Some("CNRM-CERFACS"));
        assert_eq!(institute_for_model("CMIP6/IPSL-CM6A-LR", "CMIP"), Some("IPSL"));
        assert_eq!(institute_for_model("MPI-ESM1-2-HR", "ScenarioMIP"), Some("DKRZ"));
        assert_eq!(institute_for_model("MPI-ESM1-2-HR", "CMIP"), Some("MPI-M"));
        assert_eq!(institute_for_model("UNKNOWN", "CMIP"), None);
    }
}
