//! Package selection and the final LAMMPS build.
//!
//! Runs in `lammps-<rev>/src` once every library component is in place and
//! produces exactly one executable, which is moved into the build directory.

use std::path::PathBuf;

use tracing::info;

use crate::acquire::Dependency;
use crate::component::{BuildError, Choice, ComponentSpec, Flag, MakeStep, PostAction, Sequencer, When};
use crate::execute::CommandRunner;
use crate::options::{Threads, Transport, WordSize};
use crate::workspace::Navigator;

const MPI: When = When::Transport(Transport::Mpi);
const NO_MPI: When = When::Transport(Transport::None);

/// Enables everything, then drops the packages this build path cannot support.
const SELECT_PACKAGES: MakeStep = MakeStep {
  targets: &[
    Choice::always("yes-all"),
    Choice::always("no-kokkos"),
    Choice::always("no-kim"),
    Choice::always("no-reax"),
    Choice::always("no-user-qmmm"),
    Choice::always("no-user-lb"),
    Choice::always("no-mpiio"),
    Choice::always("no-mscg"),
    Choice::always("no-user-netcdf"),
    Choice::always("no-user-intel"),
    Choice::always("no-user-quip"),
    Choice::always("no-python"),
    Choice::always("no-user-h5md"),
    Choice::always("no-user-vtk"),
  ],
  ..MakeStep::SERIAL
};

/// Packages that need a real MPI library.
const SELECT_MPI_PACKAGES: MakeStep = MakeStep {
  targets: &[Choice::always("yes-mpiio"), Choice::always("yes-user-lb")],
  when: MPI,
  ..MakeStep::SERIAL
};

const BUILD: MakeStep = MakeStep {
  flags: &[
    Flag::always("ARCHIVE", "$${tool:ar}"),
    Flag::always("SHFLAG", ""),
    Flag::always("LINK", "$(CC) -static"),
    // size(1) cannot inspect the Windows executable on this host.
    Flag::always("SIZE", "echo"),
    Flag::when(When::Threads(Threads::None), "CC", "$${tool:cxx}"),
    Flag::when(When::Threads(Threads::OpenMp), "CC", "$${tool:cxx} -fopenmp"),
    Flag::when(
      When::WordSize(WordSize::W32),
      "CCFLAGS",
      "-O3 -march=i686 -mtune=generic -mfpmath=387 -mpc64",
    ),
    Flag::when(
      When::WordSize(WordSize::W64),
      "CCFLAGS",
      "-O3 -march=core2 -mtune=core2 -msse2 -mpc64 -ffast-math",
    ),
    Flag::always("LIB", "-lwsock32 -static-libgcc -lquadmath -lpsapi"),
    Flag::always(
      "LMP_INC",
      "$${var:size_model} -DLAMMPS_JPEG -DLAMMPS_PNG -DLAMMPS_XDR -DLAMMPS_GZIP -DLAMMPS_FFMPEG",
    ),
    Flag::always("JPG_LIB", "-ljpeg -lpng -lz"),
    Flag::always("molfile_SYSLIB", ""),
    Flag::always(
      "gpu_SYSLIB",
      "-Wl,--enable-stdcall-fixup ../../../OpenCL/lib_win$${var:bits}/libOpenCL.dll",
    ),
    Flag::when(MPI, "MPI_INC", "$${var:mpi_inc} -DMPICH_SKIP_MPICXX"),
    Flag::when(MPI, "MPI_PATH", "-L../../../mpich2-win$${var:bits}/lib"),
    Flag::when(MPI, "MPI_LIB", "-lmpi"),
    Flag::when(NO_MPI, "MPI_INC", "-I../STUBS"),
    Flag::when(NO_MPI, "MPI_PATH", "-L../STUBS"),
    Flag::when(NO_MPI, "MPI_LIB", "-lmpi_stubs"),
  ],
  targets: &[Choice::when(MPI, "mpi"), Choice::when(NO_MPI, "serial")],
  ..MakeStep::PARALLEL
};

/// The final build as a component of its own.
pub const LAMMPS: ComponentSpec = ComponentSpec {
  name: "LAMMPS",
  slug: "lammps",
  root: Dependency::Lammps,
  subdir: "src",
  when: When::Always,
  steps: &[SELECT_PACKAGES, SELECT_MPI_PACKAGES, BUILD],
  post: &[
    PostAction::Relocate {
      from: "lmp_mpi",
      to: "lmp_mpi.exe",
      when: MPI,
    },
    PostAction::Relocate {
      from: "lmp_serial",
      to: "lmp_serial.exe",
      when: NO_MPI,
    },
  ],
};

/// File name of the final executable in the build directory.
pub fn executable_name(transport: Transport) -> &'static str {
  match transport {
    Transport::Mpi => "lmp_mpi.exe",
    Transport::None => "lmp_serial.exe",
  }
}

/// Select packages, build LAMMPS and move the executable into the build directory.
pub async fn assemble<R: CommandRunner>(
  sequencer: &Sequencer<'_, R>,
  nav: &mut Navigator,
) -> Result<PathBuf, BuildError> {
  info!("building LAMMPS");
  sequencer.run(&LAMMPS, nav).await?;
  Ok(sequencer.build_dir().join(executable_name(sequencer.options().transport)))
}
